//! Solved forest: node and edge sets with the root removed.

use crate::graph::{AugmentedGraph, EdgeId, Interactome, NodeId, NodePrizes};
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};

/// Node and edge sets of a PCSF solution. Both are sorted and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forest {
    nodes: Vec<NodeId>,
    edges: Vec<EdgeId>,
}

impl Forest {
    pub fn new(mut nodes: Vec<NodeId>, mut edges: Vec<EdgeId>) -> Self {
        nodes.sort_unstable();
        nodes.dedup();
        edges.sort_unstable();
        edges.dedup();
        Self { nodes, edges }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.binary_search(&node).is_ok()
    }

    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.edges.binary_search(&edge).is_ok()
    }

    fn local(&self, node: NodeId) -> Option<usize> {
        self.nodes.binary_search(&node).ok()
    }

    /// Union-find over the forest's nodes, or `None` if an edge leaves the
    /// node set.
    fn components(&self, interactome: &Interactome) -> Option<(UnionFind<usize>, usize)> {
        let mut uf = UnionFind::new(self.nodes.len());
        let mut merges = 0;
        for &edge in &self.edges {
            let e = interactome.edge(edge);
            let (a, b) = (self.local(e.source)?, self.local(e.target)?);
            if uf.union(a, b) {
                merges += 1;
            }
        }
        Some((uf, self.nodes.len() - merges))
    }

    /// Number of trees, counting isolated nodes.
    pub fn n_components(&self, interactome: &Interactome) -> usize {
        self.components(interactome).map(|(_, n)| n).unwrap_or(0)
    }

    /// True if every edge joins two forest nodes and no cycle exists.
    pub fn is_acyclic(&self, interactome: &Interactome) -> bool {
        match self.components(interactome) {
            Some((_, n_components)) => self.edges.len() + n_components == self.nodes.len(),
            None => false,
        }
    }

    /// Nodes with no incident forest edge.
    pub fn singletons(&self, interactome: &Interactome) -> Vec<NodeId> {
        let mut touched = vec![false; self.nodes.len()];
        for &edge in &self.edges {
            let e = interactome.edge(edge);
            for node in [e.source, e.target] {
                if let Some(i) = self.local(node) {
                    touched[i] = true;
                }
            }
        }
        self.nodes
            .iter()
            .zip(&touched)
            .filter(|(_, &t)| !t)
            .map(|(&n, _)| n)
            .collect()
    }

    /// Tree label per node, in node order. Trees are numbered 0, 1, ... by
    /// their first node.
    pub fn component_labels(&self, interactome: &Interactome) -> Vec<usize> {
        match self.components(interactome) {
            Some((uf, _)) => {
                let labeling = uf.into_labeling();
                let mut tree = vec![usize::MAX; self.nodes.len()];
                let mut next = 0;
                labeling
                    .iter()
                    .map(|&rep| {
                        if tree[rep] == usize::MAX {
                            tree[rep] = next;
                            next += 1;
                        }
                        tree[rep]
                    })
                    .collect()
            }
            None => (0..self.nodes.len()).collect(),
        }
    }

    /// Sum of transformed edge costs.
    pub fn edge_cost(&self, graph: &AugmentedGraph) -> f64 {
        self.edges.iter().map(|&e| graph.cost(e)).sum()
    }

    /// PCSF objective: edge costs, one root edge per tree and the scaled
    /// prizes left out.
    pub fn objective(&self, graph: &AugmentedGraph, prizes: &NodePrizes, b: f64) -> f64 {
        let missed: f64 = prizes
            .terminals()
            .iter()
            .filter(|&&t| !self.contains_node(t))
            .map(|&t| prizes.prize(t))
            .sum();
        self.edge_cost(graph)
            + graph.w() * self.n_components(graph.interactome()) as f64
            + b * missed
    }

    /// Identifiers of the forest's nodes.
    pub fn node_names<'a>(&self, interactome: &'a Interactome) -> Vec<&'a str> {
        self.nodes.iter().map(|&n| interactome.name(n)).collect()
    }
}
