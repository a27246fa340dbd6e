//! Consensus network: the ensemble union filtered by node robustness.
//!
//! Nodes are kept when their robustness reaches the threshold; edges are
//! kept when they appeared in at least one solve and both endpoints survive.
//! The result is a subgraph of the union and may contain cycles.

use crate::ensemble::runner::EnsembleResult;
use crate::error::{PcsfError, Result};
use crate::graph::{EdgeId, Interactome, NodeId};
use crate::solver::Forest;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A node of the consensus network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusNode {
    pub id: NodeId,
    pub robustness: f64,
    pub specificity: Option<f64>,
}

/// An edge of the consensus network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub robustness: f64,
}

/// Filtered subgraph of an ensemble union, sorted by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsensusNetwork {
    pub threshold: f64,
    pub nodes: Vec<ConsensusNode>,
    pub edges: Vec<ConsensusEdge>,
}

impl ConsensusNetwork {
    /// Keep nodes with robustness `>= threshold` and the edges between them.
    pub fn filter(
        interactome: &Interactome,
        ensemble: &EnsembleResult,
        threshold: f64,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(PcsfError::InvalidParameter(format!(
                "consensus threshold must be in [0, 1], got {}",
                threshold
            )));
        }
        if ensemble.noisy_edge_runs.completed == 0 {
            return Err(PcsfError::EmptyData(
                "consensus needs at least one completed noisy-edge solve".into(),
            ));
        }

        let nodes: Vec<ConsensusNode> = ensemble
            .node_robustness
            .iter()
            .filter(|(_, &r)| r >= threshold)
            .map(|(&id, &robustness)| ConsensusNode {
                id,
                robustness,
                specificity: ensemble.specificity(id),
            })
            .collect();
        let kept: BTreeSet<NodeId> = nodes.iter().map(|n| n.id).collect();

        let edges: Vec<ConsensusEdge> = ensemble
            .edge_robustness
            .iter()
            .filter_map(|(&id, &robustness)| {
                let edge = interactome.edge(id);
                (kept.contains(&edge.source) && kept.contains(&edge.target)).then_some(
                    ConsensusEdge {
                        id,
                        source: edge.source,
                        target: edge.target,
                        robustness,
                    },
                )
            })
            .collect();

        info!(
            "Consensus at {:.2}: {} of {} nodes, {} of {} edges",
            threshold,
            nodes.len(),
            ensemble.node_robustness.len(),
            edges.len(),
            ensemble.edge_robustness.len()
        );

        Ok(Self {
            threshold,
            nodes,
            edges,
        })
    }

    /// A single solution viewed as a consensus network of robustness 1.
    pub fn from_forest(interactome: &Interactome, forest: &Forest) -> Self {
        let nodes = forest
            .nodes()
            .iter()
            .map(|&id| ConsensusNode {
                id,
                robustness: 1.0,
                specificity: None,
            })
            .collect();
        let edges = forest
            .edges()
            .iter()
            .map(|&id| {
                let edge = interactome.edge(id);
                ConsensusEdge {
                    id,
                    source: edge.source,
                    target: edge.target,
                    robustness: 1.0,
                }
            })
            .collect();
        Self {
            threshold: 1.0,
            nodes,
            edges,
        }
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

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.edges.iter().map(|e| e.id).collect()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.binary_search_by_key(&node, |n| n.id).is_ok()
    }

    pub fn node(&self, node: NodeId) -> Option<&ConsensusNode> {
        self.nodes
            .binary_search_by_key(&node, |n| n.id)
            .ok()
            .map(|i| &self.nodes[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::runner::RunTally;

    fn square() -> Interactome {
        Interactome::from_edges(vec![
            ("A", "B", 0.1),
            ("B", "C", 0.1),
            ("C", "D", 0.1),
            ("D", "A", 0.1),
        ])
        .unwrap()
    }

    fn ensemble() -> EnsembleResult {
        let mut result = EnsembleResult {
            noisy_edge_runs: RunTally {
                requested: 4,
                completed: 4,
                failed: 0,
            },
            ..Default::default()
        };
        result.node_robustness.extend([(0, 1.0), (1, 0.5), (2, 1.0), (3, 0.25)]);
        result.edge_robustness.extend([(0, 0.5), (1, 0.5), (2, 0.75), (3, 0.25)]);
        result.node_specificity.insert(0, 0.5);
        result
    }

    #[test]
    fn test_threshold_zero_is_union() {
        let g = square();
        let consensus = ConsensusNetwork::filter(&g, &ensemble(), 0.0).unwrap();
        assert_eq!(consensus.n_nodes(), 4);
        assert_eq!(consensus.n_edges(), 4);
    }

    #[test]
    fn test_threshold_one_keeps_always_present() {
        let g = square();
        let consensus = ConsensusNetwork::filter(&g, &ensemble(), 1.0).unwrap();
        assert_eq!(consensus.node_ids(), vec![0, 2]);
        assert_eq!(consensus.n_edges(), 0);
        assert_eq!(consensus.node(0).unwrap().specificity, Some(0.5));
        assert!(consensus.node(1).is_none());
    }

    #[test]
    fn test_edges_need_both_endpoints() {
        let g = square();
        let consensus = ConsensusNetwork::filter(&g, &ensemble(), 0.5).unwrap();
        assert_eq!(consensus.node_ids(), vec![0, 1, 2]);
        assert_eq!(consensus.edge_ids(), vec![0, 1]);
        assert!(consensus.contains_node(1));
        assert!(!consensus.contains_node(3));
    }

    #[test]
    fn test_invalid_threshold_and_empty_ensemble() {
        let g = square();
        assert!(ConsensusNetwork::filter(&g, &ensemble(), 1.5).is_err());
        assert!(ConsensusNetwork::filter(&g, &EnsembleResult::default(), 0.5).is_err());
    }

    #[test]
    fn test_from_forest() {
        let g = square();
        let forest = Forest::new(vec![0, 1, 2], vec![0, 1]);
        let consensus = ConsensusNetwork::from_forest(&g, &forest);
        assert_eq!(consensus.n_nodes(), 3);
        assert!(consensus.edges.iter().all(|e| e.robustness == 1.0));
    }
}
