//! Protein-protein interaction graph.
//!
//! The interactome is an undirected multigraph. Nodes are interned protein
//! identifiers numbered in order of first appearance; edges keep their input
//! order and are addressed by that index, so parallel interactions between
//! the same pair stay distinct.

use crate::error::{PcsfError, Result};
use log::{debug, info};
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Dense node index.
pub type NodeId = usize;

/// Dense edge index (input order).
pub type EdgeId = usize;

/// A single undirected interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub source: NodeId,
    pub target: NodeId,
    /// Base cost, `1 - confidence` for STRING-style scores.
    pub cost: f64,
}

impl Interaction {
    /// The endpoint opposite to `node`.
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.source == node {
            self.target
        } else {
            self.source
        }
    }
}

/// Why an edge row was rejected during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRejection {
    MissingEndpoint,
    SelfLoop,
    InvalidCost,
}

/// Accumulates edge rows and produces an [`Interactome`].
#[derive(Debug, Default)]
pub struct InteractomeBuilder {
    names: Vec<String>,
    index: HashMap<String, NodeId>,
    edges: Vec<Interaction>,
    rejected: usize,
}

impl InteractomeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        id
    }

    /// Add an interaction. Invalid rows are counted and skipped.
    pub fn add_edge(
        &mut self,
        protein1: &str,
        protein2: &str,
        cost: f64,
    ) -> std::result::Result<EdgeId, EdgeRejection> {
        let (a, b) = (protein1.trim(), protein2.trim());
        let rejection = if a.is_empty() || b.is_empty() {
            Some(EdgeRejection::MissingEndpoint)
        } else if a == b {
            Some(EdgeRejection::SelfLoop)
        } else if !cost.is_finite() || cost < 0.0 {
            Some(EdgeRejection::InvalidCost)
        } else {
            None
        };
        if let Some(reason) = rejection {
            debug!("Rejected edge {} - {} ({:?})", a, b, reason);
            self.rejected += 1;
            return Err(reason);
        }

        let source = self.intern(a);
        let target = self.intern(b);
        self.edges.push(Interaction {
            source,
            target,
            cost,
        });
        Ok(self.edges.len() - 1)
    }

    /// Count a row that could not even be parsed.
    pub fn reject_row(&mut self) {
        self.rejected += 1;
    }

    /// Rows rejected so far.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Finish the graph. Fails if no edge survived.
    pub fn build(self) -> Result<Interactome> {
        if self.edges.is_empty() {
            return Err(PcsfError::EmptyData(format!(
                "interactome has no valid edges ({} rows rejected)",
                self.rejected
            )));
        }

        let mut adjacency = vec![Vec::new(); self.names.len()];
        for (id, edge) in self.edges.iter().enumerate() {
            adjacency[edge.source].push((edge.target, id));
            adjacency[edge.target].push((edge.source, id));
        }

        let interactome = Interactome {
            names: self.names,
            index: self.index,
            edges: self.edges,
            adjacency,
            rejected_edges: self.rejected,
        };
        info!(
            "Interactome: {} nodes, {} edges, {} components ({} rows rejected)",
            interactome.n_nodes(),
            interactome.n_edges(),
            interactome.n_components(),
            interactome.rejected_edges
        );
        Ok(interactome)
    }
}

/// Immutable undirected interaction multigraph.
#[derive(Debug, Clone)]
pub struct Interactome {
    names: Vec<String>,
    index: HashMap<String, NodeId>,
    edges: Vec<Interaction>,
    adjacency: Vec<Vec<(NodeId, EdgeId)>>,
    rejected_edges: usize,
}

impl Interactome {
    /// Build from `(protein1, protein2, cost)` triples.
    pub fn from_edges<'a, I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str, f64)>,
    {
        let mut builder = InteractomeBuilder::new();
        for (a, b, cost) in rows {
            // Rejections are tallied inside the builder.
            let _ = builder.add_edge(a, b, cost);
        }
        builder.build()
    }

    pub fn n_nodes(&self) -> usize {
        self.names.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of edge rows rejected while building.
    pub fn rejected_edges(&self) -> usize {
        self.rejected_edges
    }

    /// Identifier of a node.
    pub fn name(&self, node: NodeId) -> &str {
        &self.names[node]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Look up a node by identifier.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Look up a node, failing with `NodeNotFound`.
    pub fn require(&self, name: &str) -> Result<NodeId> {
        self.node_id(name)
            .ok_or_else(|| PcsfError::NodeNotFound(name.to_string()))
    }

    pub fn edge(&self, edge: EdgeId) -> &Interaction {
        &self.edges[edge]
    }

    pub fn edges(&self) -> &[Interaction] {
        &self.edges
    }

    /// Base costs in edge order.
    pub fn base_costs(&self) -> Vec<f64> {
        self.edges.iter().map(|e| e.cost).collect()
    }

    /// Incident `(neighbour, edge)` pairs in edge input order.
    pub fn neighbors(&self, node: NodeId) -> &[(NodeId, EdgeId)] {
        &self.adjacency[node]
    }

    /// Degree with parallel edges counted.
    pub fn degree(&self, node: NodeId) -> usize {
        self.adjacency[node].len()
    }

    pub fn degrees(&self) -> Vec<usize> {
        self.adjacency.iter().map(|a| a.len()).collect()
    }

    /// A petgraph view whose node and edge indices equal [`NodeId`] and
    /// [`EdgeId`], weighted by `costs`.
    pub fn to_ungraph(&self, costs: &[f64]) -> UnGraph<(), f64> {
        let mut graph = UnGraph::with_capacity(self.n_nodes(), self.n_edges());
        for _ in 0..self.n_nodes() {
            graph.add_node(());
        }
        for (edge, cost) in self.edges.iter().zip(costs) {
            graph.add_edge(NodeIndex::new(edge.source), NodeIndex::new(edge.target), *cost);
        }
        graph
    }

    /// Number of connected components.
    pub fn n_components(&self) -> usize {
        connected_components(&self.to_ungraph(&self.base_costs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> Interactome {
        Interactome::from_edges(vec![
            ("A", "B", 0.1),
            ("B", "C", 0.2),
            ("A", "B", 0.5),
            ("D", "E", 0.3),
        ])
        .unwrap()
    }

    #[test]
    fn test_nodes_interned_in_order() {
        let g = toy();
        assert_eq!(g.n_nodes(), 5);
        assert_eq!(g.node_id("A"), Some(0));
        assert_eq!(g.node_id("E"), Some(4));
        assert_eq!(g.name(2), "C");
        assert!(g.node_id("Z").is_none());
        assert!(matches!(g.require("Z"), Err(PcsfError::NodeNotFound(_))));
    }

    #[test]
    fn test_parallel_edges_kept() {
        let g = toy();
        assert_eq!(g.n_edges(), 4);
        assert_eq!(g.degree(0), 2);
        assert_eq!(g.degree(1), 3);
        assert_eq!(g.degrees(), vec![2, 3, 1, 1, 1]);
        assert_eq!(g.edge(2).cost, 0.5);
        assert_eq!(g.edge(2).other(0), 1);
    }

    #[test]
    fn test_rejected_rows_counted() {
        let mut builder = InteractomeBuilder::new();
        assert!(builder.add_edge("A", "B", 0.1).is_ok());
        assert_eq!(builder.add_edge("A", "A", 0.1), Err(EdgeRejection::SelfLoop));
        assert_eq!(builder.add_edge("", "B", 0.1), Err(EdgeRejection::MissingEndpoint));
        assert_eq!(builder.add_edge("A", "C", -1.0), Err(EdgeRejection::InvalidCost));
        assert_eq!(
            builder.add_edge("A", "C", f64::INFINITY),
            Err(EdgeRejection::InvalidCost)
        );
        builder.reject_row();
        let g = builder.build().unwrap();
        assert_eq!(g.n_edges(), 1);
        assert_eq!(g.rejected_edges(), 5);
        assert!(g.node_id("C").is_none());
    }

    #[test]
    fn test_empty_interactome_fails() {
        let mut builder = InteractomeBuilder::new();
        let _ = builder.add_edge("A", "A", 0.1);
        assert!(matches!(builder.build(), Err(PcsfError::EmptyData(_))));
    }

    #[test]
    fn test_components_and_ungraph() {
        let g = toy();
        assert_eq!(g.n_components(), 2);
        let ug = g.to_ungraph(&g.base_costs());
        assert_eq!(ug.node_count(), 5);
        assert_eq!(ug.edge_count(), 4);
    }
}
