//! Shortest-path costs between seed pairs.
//!
//! The distribution of these costs is the natural scale for `w`: a dummy edge
//! cheaper than most seed-to-seed paths yields many small trees, one dearer
//! than most yields a single connected tree.

use crate::error::{PcsfError, Result};
use crate::graph::{AugmentedGraph, Interactome, NodeId};
use log::info;
use petgraph::algo::dijkstra;
use petgraph::graph::NodeIndex;
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics, Statistics};
use std::collections::BTreeMap;

/// Configuration for seed path costs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathCostConfig {
    /// Fraction of seed pairs evaluated, in `(0, 1]`.
    pub sampled_proportion: f64,
    /// Seed for pair sampling.
    pub seed: u64,
}

impl Default for PathCostConfig {
    fn default() -> Self {
        Self {
            sampled_proportion: 1.0,
            seed: 42,
        }
    }
}

/// Cost of the cheapest path between two seeds; `None` when disconnected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedPairCost {
    pub source: NodeId,
    pub target: NodeId,
    pub cost: Option<f64>,
}

/// Distribution summary of reachable pair costs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathCostSummary {
    pub n_pairs: usize,
    pub n_unreachable: usize,
    pub min: f64,
    pub lower_quartile: f64,
    pub median: f64,
    pub upper_quartile: f64,
    pub max: f64,
    pub mean: f64,
}

/// Pairwise seed path costs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathCosts {
    pub pairs: Vec<SeedPairCost>,
    /// Number of pairs before sampling.
    pub total_pairs: usize,
}

/// Cheapest path cost between seed pairs over transformed edge costs.
pub fn seed_path_costs(
    graph: &AugmentedGraph,
    seeds: &[NodeId],
    config: &PathCostConfig,
) -> Result<PathCosts> {
    let p = config.sampled_proportion;
    if !(p > 0.0 && p <= 1.0) {
        return Err(PcsfError::InvalidParameter(format!(
            "sampled proportion must be in (0, 1], got {}",
            p
        )));
    }

    let mut unique = seeds.to_vec();
    unique.sort_unstable();
    unique.dedup();
    let all_pairs: Vec<(NodeId, NodeId)> = unique
        .iter()
        .enumerate()
        .flat_map(|(i, &a)| unique[i + 1..].iter().map(move |&b| (a, b)))
        .collect();
    let total_pairs = all_pairs.len();

    let chosen: Vec<(NodeId, NodeId)> = if p < 1.0 && total_pairs > 0 {
        let amount = ((total_pairs as f64 * p).floor() as usize).max(1);
        let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
        let mut picked = sample(&mut rng, total_pairs, amount).into_vec();
        picked.sort_unstable();
        picked.into_iter().map(|i| all_pairs[i]).collect()
    } else {
        all_pairs
    };

    let mut by_source: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    for &(a, b) in &chosen {
        by_source.entry(a).or_default().push(b);
    }

    let ungraph = graph.interactome().to_ungraph(graph.costs());
    let sources: Vec<(NodeId, Vec<NodeId>)> = by_source.into_iter().collect();
    let pairs: Vec<SeedPairCost> = sources
        .par_iter()
        .flat_map_iter(|(source, targets)| {
            let distances = dijkstra(&ungraph, NodeIndex::new(*source), None, |e| *e.weight());
            targets
                .iter()
                .map(|&target| SeedPairCost {
                    source: *source,
                    target,
                    cost: distances.get(&NodeIndex::new(target)).copied(),
                })
                .collect::<Vec<_>>()
        })
        .collect();

    info!(
        "Computed {} of {} seed pair path costs",
        pairs.len(),
        total_pairs
    );
    Ok(PathCosts { pairs, total_pairs })
}

impl PathCosts {
    /// Costs of connected pairs.
    pub fn reachable(&self) -> Vec<f64> {
        self.pairs.iter().filter_map(|p| p.cost).collect()
    }

    pub fn summary(&self) -> PathCostSummary {
        let costs = self.reachable();
        let n_unreachable = self.pairs.len() - costs.len();
        if costs.is_empty() {
            return PathCostSummary {
                n_pairs: self.pairs.len(),
                n_unreachable,
                min: f64::NAN,
                lower_quartile: f64::NAN,
                median: f64::NAN,
                upper_quartile: f64::NAN,
                max: f64::NAN,
                mean: f64::NAN,
            };
        }
        let mean = costs.iter().mean();
        let min = costs.iter().copied().fold(f64::INFINITY, f64::min);
        let max = costs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut data = Data::new(costs);
        PathCostSummary {
            n_pairs: self.pairs.len(),
            n_unreachable,
            min,
            lower_quartile: data.lower_quartile(),
            median: data.quantile(0.5),
            upper_quartile: data.upper_quartile(),
            max,
            mean,
        }
    }

    /// Tab-separated `source, target, cost` with node names.
    pub fn to_tsv(&self, interactome: &Interactome) -> String {
        let mut out = String::from("source\ttarget\tcost\n");
        for pair in &self.pairs {
            let cost = pair
                .cost
                .map(|c| format!("{:.6}", c))
                .unwrap_or_else(|| "NA".into());
            out.push_str(&format!(
                "{}\t{}\t{}\n",
                interactome.name(pair.source),
                interactome.name(pair.target),
                cost
            ));
        }
        out
    }
}

impl std::fmt::Display for PathCostSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Seed Path Costs")?;
        writeln!(f, "===============")?;
        writeln!(
            f,
            "Pairs: {} ({} unreachable)",
            self.n_pairs, self.n_unreachable
        )?;
        writeln!(
            f,
            "Min {:.4} | Q1 {:.4} | Median {:.4} | Q3 {:.4} | Max {:.4}",
            self.min, self.lower_quartile, self.median, self.upper_quartile, self.max
        )?;
        writeln!(f, "Mean {:.4}", self.mean)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PcsfParams;

    fn graph() -> Interactome {
        Interactome::from_edges(vec![
            ("A", "B", 0.1),
            ("B", "C", 0.2),
            ("C", "D", 0.1),
            ("A", "D", 0.9),
            ("X", "Y", 0.5),
        ])
        .unwrap()
    }

    #[test]
    fn test_all_pairs() {
        let g = graph();
        let aug = AugmentedGraph::new(&g, &PcsfParams::new(1.0, 1.0).with_g(0.0)).unwrap();
        let seeds = vec![0, 3, 4, 0];
        let costs = seed_path_costs(&aug, &seeds, &PathCostConfig::default()).unwrap();
        assert_eq!(costs.total_pairs, 3);
        assert_eq!(costs.pairs.len(), 3);
        let ad = costs.pairs.iter().find(|p| p.source == 0 && p.target == 3).unwrap();
        assert!((ad.cost.unwrap() - 0.4).abs() < 1e-12);
        let summary = costs.summary();
        assert_eq!(summary.n_unreachable, 2);
        assert!((summary.median - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_sampled_pairs_reproducible() {
        let g = graph();
        let aug = AugmentedGraph::new(&g, &PcsfParams::new(1.0, 1.0).with_g(0.0)).unwrap();
        let seeds: Vec<NodeId> = (0..6).collect();
        let config = PathCostConfig {
            sampled_proportion: 0.5,
            seed: 7,
        };
        let a = seed_path_costs(&aug, &seeds, &config).unwrap();
        let b = seed_path_costs(&aug, &seeds, &config).unwrap();
        assert_eq!(a.total_pairs, 15);
        assert_eq!(a.pairs.len(), 7);
        assert_eq!(a.pairs, b.pairs);
    }

    #[test]
    fn test_invalid_proportion() {
        let g = graph();
        let aug = AugmentedGraph::new(&g, &PcsfParams::new(1.0, 1.0)).unwrap();
        let config = PathCostConfig {
            sampled_proportion: 0.0,
            seed: 1,
        };
        assert!(seed_path_costs(&aug, &[0, 1], &config).is_err());
    }

    #[test]
    fn test_tsv_marks_unreachable() {
        let g = graph();
        let aug = AugmentedGraph::new(&g, &PcsfParams::new(1.0, 1.0).with_g(0.0)).unwrap();
        let costs = seed_path_costs(&aug, &[0, 4], &PathCostConfig::default()).unwrap();
        let tsv = costs.to_tsv(&g);
        assert_eq!(tsv.lines().nth(1), Some("A\tX\tNA"));
        assert!(costs.summary().median.is_nan());
    }
}
