//! Community detection on consensus networks.
//!
//! Communities maximise modularity at a configurable resolution `γ`:
//!
//! ```text
//! Q = Σ_c [ L_c / m - γ (d_c / 2m)^2 ]
//! ```
//!
//! where `L_c` is the edge weight inside community `c`, `d_c` the summed
//! weighted degree of its members and `m` the total edge weight. Larger `γ`
//! gives smaller communities. Edge weights are ensemble robustness values.

pub mod louvain;

use crate::ensemble::ConsensusNetwork;
use crate::error::{PcsfError, Result};
use crate::graph::NodeId;
use log::info;
use louvain::WeightedGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for community detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    /// Modularity resolution `γ`.
    pub resolution: f64,
    /// Communities with fewer members are discarded.
    pub min_size: usize,
    /// Maximum number of aggregation levels.
    pub max_levels: usize,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            min_size: 3,
            max_levels: 20,
        }
    }
}

impl CommunityConfig {
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(PcsfError::InvalidParameter(format!(
                "resolution must be finite and > 0, got {}",
                self.resolution
            )));
        }
        if self.min_size == 0 {
            return Err(PcsfError::InvalidParameter(
                "min_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// A group of nodes. `label` is the rank by size, starting at 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub label: usize,
    /// Member ids, ascending.
    pub members: Vec<NodeId>,
}

impl Community {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

fn weighted_graph(network: &ConsensusNetwork) -> WeightedGraph {
    let local: HashMap<NodeId, usize> = network
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id, i))
        .collect();
    let edges: Vec<(usize, usize, f64)> = network
        .edges
        .iter()
        .filter_map(|e| {
            let weight = if e.robustness > 0.0 { e.robustness } else { 1.0 };
            Some((*local.get(&e.source)?, *local.get(&e.target)?, weight))
        })
        .collect();
    WeightedGraph::from_edges(network.n_nodes(), &edges)
}

/// Partition the network into communities of at least `min_size` members,
/// largest first (ties by smallest member id).
pub fn partition(network: &ConsensusNetwork, config: &CommunityConfig) -> Result<Vec<Community>> {
    config.validate()?;
    if network.is_empty() {
        return Ok(Vec::new());
    }

    let graph = weighted_graph(network);
    let labels = louvain::detect(&graph, config.resolution, config.max_levels);

    let n_labels = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut groups: Vec<Vec<NodeId>> = vec![Vec::new(); n_labels];
    for (node, &label) in network.nodes.iter().zip(&labels) {
        groups[label].push(node.id);
    }

    let found = groups.len();
    let mut groups: Vec<Vec<NodeId>> = groups
        .into_iter()
        .filter(|g| g.len() >= config.min_size)
        .collect();
    groups.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));

    info!(
        "Found {} communities, {} with at least {} members (modularity {:.3})",
        found,
        groups.len(),
        config.min_size,
        graph.modularity(&labels, config.resolution)
    );

    Ok(groups
        .into_iter()
        .enumerate()
        .map(|(label, members)| Community { label, members })
        .collect())
}

/// Node id -> community label.
pub fn community_labels(communities: &[Community]) -> HashMap<NodeId, usize> {
    communities
        .iter()
        .flat_map(|c| c.members.iter().map(move |&m| (m, c.label)))
        .collect()
}

/// Modularity of `communities` on `network`. Nodes outside every community
/// count as singletons.
pub fn modularity(network: &ConsensusNetwork, communities: &[Community], resolution: f64) -> f64 {
    let graph = weighted_graph(network);
    let labels = community_labels(communities);
    let offset = communities.len();
    let membership: Vec<usize> = network
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| labels.get(&n.id).copied().unwrap_or(offset + i))
        .collect();
    graph.modularity(&membership, resolution)
}
