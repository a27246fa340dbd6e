//! `(w, b)` parameter sweeps.
//!
//! Every grid point is solved once without edge noise. Solutions are
//! compared pairwise by Jaccard similarity and labelled edit distance, and
//! each point is scored by its mean similarity to its grid neighbours. The
//! point with the highest score sits in the most stable region of the grid;
//! it is a suggestion, not a selection rule.

use crate::error::{PcsfError, Result};
use crate::graph::{AugmentedGraph, NodePrizes};
use crate::sensitivity::similarity::{
    jaccard, matrix_to_tsv, solution_edit_distance, solution_similarity, SimilarityMetric,
};
use crate::solver::{solve, Forest};
use log::{info, warn};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

// ============================================================================
// Core Types
// ============================================================================

/// Configuration for a sensitivity sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityConfig {
    /// Dummy edge costs to test.
    pub w_values: Vec<f64>,
    /// Prize multipliers to test.
    pub b_values: Vec<f64>,
    /// Element set compared between solutions.
    pub metric: SimilarityMetric,
    /// Whether to use parallel computation.
    pub parallel: bool,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            w_values: vec![1.0, 2.0, 4.0, 6.0, 8.0],
            b_values: vec![1.0, 2.0, 5.0, 10.0],
            metric: SimilarityMetric::Nodes,
            parallel: true,
        }
    }
}

impl SensitivityConfig {
    /// Create a quick config for fast testing (2 x 2 grid).
    pub fn quick() -> Self {
        Self {
            w_values: vec![1.0, 2.0],
            b_values: vec![1.0, 2.0],
            ..Default::default()
        }
    }

    /// Set dummy edge costs.
    pub fn with_w_values(mut self, w_values: Vec<f64>) -> Self {
        self.w_values = w_values;
        self
    }

    /// Set prize multipliers.
    pub fn with_b_values(mut self, b_values: Vec<f64>) -> Self {
        self.b_values = b_values;
        self
    }

    /// Set the similarity metric.
    pub fn with_metric(mut self, metric: SimilarityMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.w_values.is_empty() || self.b_values.is_empty() {
            return Err(PcsfError::InvalidParameter(
                "sensitivity grid needs at least one w and one b value".into(),
            ));
        }
        if let Some(w) = self.w_values.iter().find(|w| !w.is_finite() || **w <= 0.0) {
            return Err(PcsfError::InvalidParameter(format!(
                "w values must be finite and > 0, got {}",
                w
            )));
        }
        if let Some(b) = self.b_values.iter().find(|b| !b.is_finite() || **b < 1.0) {
            return Err(PcsfError::InvalidParameter(format!(
                "b values must be finite and >= 1, got {}",
                b
            )));
        }
        Ok(())
    }
}

/// One grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterPoint {
    pub w: f64,
    pub b: f64,
    pub w_index: usize,
    pub b_index: usize,
}

impl ParameterPoint {
    pub fn label(&self) -> String {
        format!("w={}_b={}", self.w, self.b)
    }
}

/// Outcome of one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed(String),
    Skipped,
}

/// Result of solving one grid point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRun {
    pub point: ParameterPoint,
    pub status: RunStatus,
    pub forest: Option<Forest>,
    pub n_nodes: usize,
    pub n_edges: usize,
    pub n_terminals: usize,
    pub n_components: usize,
    /// Row of this run in the similarity matrix.
    pub matrix_index: Option<usize>,
    /// Mean similarity to completed grid neighbours.
    pub stability: Option<f64>,
}

/// Complete sweep results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivitySweep {
    pub config: SensitivityConfig,
    /// Runs in grid order (`w` outer, `b` inner).
    pub runs: Vec<SweepRun>,
    /// Pairwise similarity of completed runs.
    pub similarity: DMatrix<f64>,
    /// Pairwise labelled edit distance of completed runs.
    pub edit_distance: DMatrix<f64>,
    /// Matrix row labels.
    pub labels: Vec<String>,
    pub most_stable: Option<ParameterPoint>,
    pub n_failed: usize,
    pub interrupted: bool,
}

// ============================================================================
// Grid Generation
// ============================================================================

/// Every `(w, b)` combination, `w` outer.
pub fn generate_parameter_grid(config: &SensitivityConfig) -> Vec<ParameterPoint> {
    let mut grid = Vec::with_capacity(config.w_values.len() * config.b_values.len());
    for (w_index, &w) in config.w_values.iter().enumerate() {
        for (b_index, &b) in config.b_values.iter().enumerate() {
            grid.push(ParameterPoint {
                w,
                b,
                w_index,
                b_index,
            });
        }
    }
    grid
}

fn run_point(
    graph: &AugmentedGraph,
    prizes: &NodePrizes,
    point: ParameterPoint,
    interrupt: &AtomicBool,
) -> SweepRun {
    let mut run = SweepRun {
        point,
        status: RunStatus::Skipped,
        forest: None,
        n_nodes: 0,
        n_edges: 0,
        n_terminals: 0,
        n_components: 0,
        matrix_index: None,
        stability: None,
    };
    if interrupt.load(Ordering::Relaxed) {
        return run;
    }

    match graph
        .with_w(point.w)
        .and_then(|g| solve(&g, prizes, point.b))
    {
        Ok(forest) => {
            run.n_nodes = forest.n_nodes();
            run.n_edges = forest.n_edges();
            run.n_terminals = prizes
                .terminals()
                .iter()
                .filter(|&&t| forest.contains_node(t))
                .count();
            run.n_components = forest.n_components(graph.interactome());
            run.forest = Some(forest);
            run.status = RunStatus::Completed;
        }
        Err(e) => run.status = RunStatus::Failed(e.to_string()),
    }
    run
}

// ============================================================================
// Main Runner
// ============================================================================

/// Solve every grid point and compare the solutions.
pub fn run_sensitivity_sweep(
    graph: &AugmentedGraph,
    prizes: &NodePrizes,
    config: &SensitivityConfig,
) -> Result<SensitivitySweep> {
    run_sensitivity_sweep_interruptible(graph, prizes, config, &AtomicBool::new(false))
}

/// As [`run_sensitivity_sweep`], leaving unscheduled points skipped once
/// `interrupt` is set.
pub fn run_sensitivity_sweep_interruptible(
    graph: &AugmentedGraph,
    prizes: &NodePrizes,
    config: &SensitivityConfig,
    interrupt: &AtomicBool,
) -> Result<SensitivitySweep> {
    config.validate()?;
    let grid = generate_parameter_grid(config);
    info!(
        "Sensitivity sweep: {} w values x {} b values",
        config.w_values.len(),
        config.b_values.len()
    );

    let mut runs: Vec<SweepRun> = if config.parallel {
        grid.par_iter()
            .map(|&point| run_point(graph, prizes, point, interrupt))
            .collect()
    } else {
        grid.iter()
            .map(|&point| run_point(graph, prizes, point, interrupt))
            .collect()
    };

    let n_failed = runs
        .iter()
        .filter(|r| matches!(r.status, RunStatus::Failed(_)))
        .count();
    let interrupted = runs.iter().any(|r| r.status == RunStatus::Skipped);
    let completed: Vec<usize> = (0..runs.len())
        .filter(|&i| runs[i].status == RunStatus::Completed)
        .collect();

    if completed.is_empty() && n_failed > 0 {
        let last_error = runs
            .iter()
            .rev()
            .find_map(|r| match &r.status {
                RunStatus::Failed(e) => Some(e.clone()),
                _ => None,
            })
            .unwrap_or_default();
        return Err(PcsfError::AllIterationsFailed {
            attempted: n_failed,
            last_error,
        });
    }
    if n_failed > 0 {
        warn!("{} of {} sweep points failed", n_failed, runs.len());
    }

    for (row, &i) in completed.iter().enumerate() {
        runs[i].matrix_index = Some(row);
    }
    let forests: Vec<&Forest> = completed
        .iter()
        .filter_map(|&i| runs[i].forest.as_ref())
        .collect();
    let similarity = solution_similarity(&forests, config.metric);
    let edit_distance = solution_edit_distance(&forests);
    let labels = completed.iter().map(|&i| runs[i].point.label()).collect();

    score_stability(&mut runs, config);
    let most_stable = runs
        .iter()
        .filter_map(|r| r.stability.map(|s| (r.point, s)))
        .fold(None, |best: Option<(ParameterPoint, f64)>, (point, s)| match best {
            Some((_, best_s)) if best_s >= s => best,
            _ => Some((point, s)),
        })
        .map(|(point, _)| point);

    if let Some(point) = &most_stable {
        info!("Most stable region around w={}, b={}", point.w, point.b);
    }

    Ok(SensitivitySweep {
        config: config.clone(),
        runs,
        similarity,
        edit_distance,
        labels,
        most_stable,
        n_failed,
        interrupted,
    })
}

/// Mean similarity of each completed run to its completed 4-neighbours.
fn score_stability(runs: &mut [SweepRun], config: &SensitivityConfig) {
    let n_b = config.b_values.len();
    let n_w = config.w_values.len();
    let sets: Vec<Option<Vec<usize>>> = runs
        .iter()
        .map(|r| {
            r.forest.as_ref().map(|f| match config.metric {
                SimilarityMetric::Nodes => f.nodes().to_vec(),
                SimilarityMetric::Edges => f.edges().to_vec(),
            })
        })
        .collect();

    for (idx, run) in runs.iter_mut().enumerate() {
        let Some(own) = &sets[idx] else { continue };
        let (wi, bi) = (run.point.w_index, run.point.b_index);
        let mut neighbours = Vec::with_capacity(4);
        if wi > 0 {
            neighbours.push(idx - n_b);
        }
        if wi + 1 < n_w {
            neighbours.push(idx + n_b);
        }
        if bi > 0 {
            neighbours.push(idx - 1);
        }
        if bi + 1 < n_b {
            neighbours.push(idx + 1);
        }
        let scores: Vec<f64> = neighbours
            .iter()
            .filter_map(|&n| sets[n].as_ref().map(|other| jaccard(own, other)))
            .collect();
        if !scores.is_empty() {
            run.stability = Some(scores.iter().sum::<f64>() / scores.len() as f64);
        }
    }
}

// ============================================================================
// Display Implementations
// ============================================================================

impl std::fmt::Display for SensitivitySweep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Parameter Sensitivity Sweep")?;
        writeln!(f, "===========================")?;
        writeln!(
            f,
            "{:>8} {:>8} {:>7} {:>7} {:>10} {:>6} {:>9}",
            "w", "b", "nodes", "edges", "terminals", "trees", "stability"
        )?;
        for run in &self.runs {
            match &run.status {
                RunStatus::Completed => writeln!(
                    f,
                    "{:>8.3} {:>8.3} {:>7} {:>7} {:>10} {:>6} {:>9}",
                    run.point.w,
                    run.point.b,
                    run.n_nodes,
                    run.n_edges,
                    run.n_terminals,
                    run.n_components,
                    run.stability
                        .map(|s| format!("{:.3}", s))
                        .unwrap_or_else(|| "-".into())
                )?,
                RunStatus::Failed(e) => {
                    writeln!(f, "{:>8.3} {:>8.3} FAILED: {}", run.point.w, run.point.b, e)?
                }
                RunStatus::Skipped => {
                    writeln!(f, "{:>8.3} {:>8.3} skipped", run.point.w, run.point.b)?
                }
            }
        }
        writeln!(f)?;
        match &self.most_stable {
            Some(point) => writeln!(f, "Most stable: w={}, b={}", point.w, point.b)?,
            None => writeln!(f, "Most stable: n/a")?,
        }
        if self.interrupted {
            writeln!(f, "WARNING: sweep was interrupted")?;
        }
        Ok(())
    }
}

impl SensitivitySweep {
    /// Convert the per-run table to CSV.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        csv.push_str("w,b,status,n_nodes,n_edges,n_terminals,n_components,stability\n");
        for run in &self.runs {
            let status = match &run.status {
                RunStatus::Completed => "completed",
                RunStatus::Failed(_) => "failed",
                RunStatus::Skipped => "skipped",
            };
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                run.point.w,
                run.point.b,
                status,
                run.n_nodes,
                run.n_edges,
                run.n_terminals,
                run.n_components,
                run.stability.map(|s| format!("{:.4}", s)).unwrap_or_default()
            ));
        }
        csv
    }

    /// Similarity matrix as labelled TSV.
    pub fn similarity_tsv(&self) -> String {
        matrix_to_tsv(&self.similarity, &self.labels)
    }

    /// Edit-distance matrix as labelled TSV.
    pub fn edit_distance_tsv(&self) -> String {
        matrix_to_tsv(&self.edit_distance, &self.labels)
    }

    /// Convert to JSON format for export.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Completed run at the given grid point.
    pub fn run_at(&self, w_index: usize, b_index: usize) -> Option<&SweepRun> {
        self.runs
            .iter()
            .find(|r| r.point.w_index == w_index && r.point.b_index == b_index)
    }
}

// ============================================================================
// Tests
// ============================================================================
