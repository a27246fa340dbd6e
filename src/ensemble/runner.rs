//! Randomized re-solves and inclusion frequencies.
//!
//! Two kinds of repetition are supported:
//!
//! - **noisy edges**: every transformed edge cost is perturbed by uniform
//!   relative noise; the inclusion frequency is the *robustness* of a node
//!   or edge.
//! - **random terminals**: every terminal's prize moves to a node of similar
//!   degree; the inclusion frequency is the *specificity*.
//!
//! Each iteration draws from its own ChaCha stream derived from the base seed
//! and the iteration index, so parallel and sequential runs give identical
//! frequencies. Counts are accumulated in per-worker arenas indexed by node
//! and edge id and normalised once at the end.
//!
//! # Example
//!
//! ```ignore
//! use pcsf_network::ensemble::{run_ensemble, EnsembleConfig};
//!
//! let config = EnsembleConfig::quick();
//! let result = run_ensemble(&graph, &prizes, &params, &config)?;
//! println!("{}", result);
//! ```

use crate::ensemble::randomize::{iteration_rng, perturb_costs, resample_terminals, RandomStream};
use crate::error::{PcsfError, Result};
use crate::graph::{AugmentedGraph, EdgeId, NodeId, NodePrizes, PcsfParams};
use crate::solver::{solve, Forest};
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

// ============================================================================
// Core Types
// ============================================================================

/// Configuration of an ensemble run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Repetitions with perturbed edge costs.
    pub noisy_edge_reps: usize,
    /// Repetitions with resampled terminals.
    pub random_terminal_reps: usize,
    /// Whether to use parallel computation.
    pub parallel: bool,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            noisy_edge_reps: 100,
            random_terminal_reps: 0,
            parallel: true,
        }
    }
}

impl EnsembleConfig {
    /// Create a quick configuration for testing (fewer repetitions).
    pub fn quick() -> Self {
        Self {
            noisy_edge_reps: 10,
            ..Default::default()
        }
    }

    /// Set the number of noisy-edge repetitions.
    pub fn with_noisy_edge_reps(mut self, reps: usize) -> Self {
        self.noisy_edge_reps = reps;
        self
    }

    /// Set the number of random-terminal repetitions.
    pub fn with_random_terminal_reps(mut self, reps: usize) -> Self {
        self.random_terminal_reps = reps;
        self
    }

    /// Enable or disable the rayon pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Outcome counts for one kind of repetition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTally {
    pub requested: usize,
    pub completed: usize,
    pub failed: usize,
}

impl RunTally {
    /// Iterations never started because of an interrupt.
    pub fn skipped(&self) -> usize {
        self.requested - self.completed - self.failed
    }
}

/// Inclusion frequencies over an ensemble.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnsembleResult {
    /// Node id -> fraction of noisy-edge solves containing it.
    pub node_robustness: BTreeMap<NodeId, f64>,
    /// Edge id -> fraction of noisy-edge solves containing it.
    pub edge_robustness: BTreeMap<EdgeId, f64>,
    /// Node id -> fraction of random-terminal solves containing it.
    pub node_specificity: BTreeMap<NodeId, f64>,
    /// Edge id -> fraction of random-terminal solves containing it.
    pub edge_specificity: BTreeMap<EdgeId, f64>,
    pub noisy_edge_runs: RunTally,
    pub random_terminal_runs: RunTally,
    /// True if an interrupt left iterations unscheduled.
    pub interrupted: bool,
}

/// Descriptive statistics of node robustness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleSummary {
    pub n_nodes: usize,
    pub n_edges: usize,
    pub mean_robustness: f64,
    pub median_robustness: f64,
    pub std_robustness: f64,
    /// Nodes present in every successful noisy-edge solve.
    pub n_fully_robust: usize,
}

// ============================================================================
// Counter Arenas
// ============================================================================

#[derive(Debug, Clone)]
struct InclusionCounts {
    nodes: Vec<u32>,
    edges: Vec<u32>,
    completed: usize,
    failed: usize,
    last_error: Option<String>,
}

impl InclusionCounts {
    fn new(n_nodes: usize, n_edges: usize) -> Self {
        Self {
            nodes: vec![0; n_nodes],
            edges: vec![0; n_edges],
            completed: 0,
            failed: 0,
            last_error: None,
        }
    }

    fn record(&mut self, forest: &Forest) {
        for &node in forest.nodes() {
            self.nodes[node] += 1;
        }
        for &edge in forest.edges() {
            self.edges[edge] += 1;
        }
        self.completed += 1;
    }

    fn record_failure(&mut self, error: PcsfError) {
        self.failed += 1;
        self.last_error = Some(error.to_string());
    }

    fn merge(mut self, other: Self) -> Self {
        for (a, b) in self.nodes.iter_mut().zip(&other.nodes) {
            *a += b;
        }
        for (a, b) in self.edges.iter_mut().zip(&other.edges) {
            *a += b;
        }
        self.completed += other.completed;
        self.failed += other.failed;
        if self.last_error.is_none() {
            self.last_error = other.last_error;
        }
        self
    }

    fn tally(&self, requested: usize) -> RunTally {
        RunTally {
            requested,
            completed: self.completed,
            failed: self.failed,
        }
    }

    fn frequencies(counts: &[u32], completed: usize) -> BTreeMap<usize, f64> {
        if completed == 0 {
            return BTreeMap::new();
        }
        counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(id, &c)| (id, c as f64 / completed as f64))
            .collect()
    }
}

fn run_batch<F>(
    n_iterations: usize,
    n_nodes: usize,
    n_edges: usize,
    parallel: bool,
    interrupt: &AtomicBool,
    solve_one: F,
) -> InclusionCounts
where
    F: Fn(usize) -> Result<Forest> + Sync,
{
    let step = |mut acc: InclusionCounts, iteration: usize| {
        if interrupt.load(Ordering::Relaxed) {
            return acc;
        }
        match solve_one(iteration) {
            Ok(forest) => acc.record(&forest),
            Err(e) => acc.record_failure(e),
        }
        acc
    };

    if parallel {
        (0..n_iterations)
            .into_par_iter()
            .fold(|| InclusionCounts::new(n_nodes, n_edges), step)
            .reduce(|| InclusionCounts::new(n_nodes, n_edges), InclusionCounts::merge)
    } else {
        (0..n_iterations).fold(InclusionCounts::new(n_nodes, n_edges), step)
    }
}

fn check_batch(kind: &str, counts: &InclusionCounts, requested: usize) -> Result<()> {
    if counts.failed > 0 {
        warn!(
            "{} of {} {} iterations failed",
            counts.failed, requested, kind
        );
    }
    if counts.completed == 0 && counts.failed > 0 {
        return Err(PcsfError::AllIterationsFailed {
            attempted: counts.failed,
            last_error: counts.last_error.clone().unwrap_or_default(),
        });
    }
    Ok(())
}

// ============================================================================
// Main Runner
// ============================================================================

/// Run the ensemble to completion.
pub fn run_ensemble(
    graph: &AugmentedGraph,
    prizes: &NodePrizes,
    params: &PcsfParams,
    config: &EnsembleConfig,
) -> Result<EnsembleResult> {
    run_ensemble_interruptible(graph, prizes, params, config, &AtomicBool::new(false))
}

/// Run the ensemble, stopping early once `interrupt` is set.
///
/// Iterations already finished when the flag is raised are kept and the
/// result is marked `interrupted`.
pub fn run_ensemble_interruptible(
    graph: &AugmentedGraph,
    prizes: &NodePrizes,
    params: &PcsfParams,
    config: &EnsembleConfig,
    interrupt: &AtomicBool,
) -> Result<EnsembleResult> {
    params.validate()?;
    if config.noisy_edge_reps == 0 && config.random_terminal_reps == 0 {
        return Err(PcsfError::InvalidParameter(
            "ensemble needs at least one noisy-edge or random-terminal repetition".into(),
        ));
    }

    let interactome = graph.interactome();
    let (n_nodes, n_edges) = (interactome.n_nodes(), interactome.n_edges());
    info!(
        "Running ensemble: {} noisy-edge, {} random-terminal repetitions",
        config.noisy_edge_reps, config.random_terminal_reps
    );

    let noisy = run_batch(
        config.noisy_edge_reps,
        n_nodes,
        n_edges,
        config.parallel,
        interrupt,
        |iteration| {
            let mut rng = iteration_rng(params.seed, RandomStream::EdgeNoise, iteration);
            let costs = perturb_costs(graph.costs(), params.edge_noise, &mut rng);
            solve(&graph.with_costs(costs)?, prizes, params.b)
        },
    );
    check_batch("noisy-edge", &noisy, config.noisy_edge_reps)?;

    let random = run_batch(
        config.random_terminal_reps,
        n_nodes,
        n_edges,
        config.parallel,
        interrupt,
        |iteration| {
            let mut rng = iteration_rng(params.seed, RandomStream::RandomTerminals, iteration);
            let moved = resample_terminals(interactome, prizes, &mut rng)?;
            solve(graph, &moved, params.b)
        },
    );
    check_batch("random-terminal", &random, config.random_terminal_reps)?;

    let noisy_edge_runs = noisy.tally(config.noisy_edge_reps);
    let random_terminal_runs = random.tally(config.random_terminal_reps);
    let interrupted = noisy_edge_runs.skipped() + random_terminal_runs.skipped() > 0;
    if interrupted {
        info!(
            "Ensemble interrupted after {} noisy-edge and {} random-terminal iterations",
            noisy_edge_runs.completed, random_terminal_runs.completed
        );
    }

    Ok(EnsembleResult {
        node_robustness: InclusionCounts::frequencies(&noisy.nodes, noisy.completed),
        edge_robustness: InclusionCounts::frequencies(&noisy.edges, noisy.completed),
        node_specificity: InclusionCounts::frequencies(&random.nodes, random.completed),
        edge_specificity: InclusionCounts::frequencies(&random.edges, random.completed),
        noisy_edge_runs,
        random_terminal_runs,
        interrupted,
    })
}

impl EnsembleResult {
    pub fn robustness(&self, node: NodeId) -> Option<f64> {
        self.node_robustness.get(&node).copied()
    }

    pub fn specificity(&self, node: NodeId) -> Option<f64> {
        self.node_specificity.get(&node).copied()
    }

    pub fn edge_robustness_of(&self, edge: EdgeId) -> Option<f64> {
        self.edge_robustness.get(&edge).copied()
    }

    /// Robustness statistics over nodes seen at least once.
    pub fn summary(&self) -> EnsembleSummary {
        let values: Vec<f64> = self.node_robustness.values().copied().collect();
        let (mean, median, std) = if values.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let std = if values.len() > 1 {
                values.iter().std_dev()
            } else {
                0.0
            };
            (values.iter().mean(), Data::new(values.clone()).median(), std)
        };
        EnsembleSummary {
            n_nodes: values.len(),
            n_edges: self.edge_robustness.len(),
            mean_robustness: mean,
            median_robustness: median,
            std_robustness: std,
            n_fully_robust: values.iter().filter(|&&v| v >= 1.0).count(),
        }
    }

    /// Convert to JSON format for export.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// Display Implementations
// ============================================================================

impl std::fmt::Display for EnsembleResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let summary = self.summary();
        writeln!(f, "Ensemble Results")?;
        writeln!(f, "================")?;
        writeln!(
            f,
            "Noisy-edge runs:      {}/{} completed ({} failed)",
            self.noisy_edge_runs.completed, self.noisy_edge_runs.requested, self.noisy_edge_runs.failed
        )?;
        writeln!(
            f,
            "Random-terminal runs: {}/{} completed ({} failed)",
            self.random_terminal_runs.completed,
            self.random_terminal_runs.requested,
            self.random_terminal_runs.failed
        )?;
        if self.interrupted {
            writeln!(f, "WARNING: run was interrupted, frequencies are partial")?;
        }
        writeln!(f)?;
        writeln!(f, "Union: {} nodes, {} edges", summary.n_nodes, summary.n_edges)?;
        writeln!(
            f,
            "Node robustness: mean {:.3}, median {:.3}, sd {:.3}",
            summary.mean_robustness, summary.median_robustness, summary.std_robustness
        )?;
        writeln!(f, "Nodes in every solve: {}", summary.n_fully_robust)?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
