//! Pipeline runner composing solve, ensemble, consensus, community and
//! annotation steps.

use crate::analysis::{annotate_nodes, NodeAnnotation};
use crate::community::{modularity, partition, Community};
use crate::ensemble::{run_ensemble_interruptible, ConsensusNetwork, EnsembleResult, RunTally};
use crate::error::{PcsfError, Result};
use crate::graph::{AugmentedGraph, Interactome, NodePrizes, PcsfParams};
use crate::pipeline::config::PcsfConfig;
use crate::solver::{solve, Forest};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;

/// A step in the inference pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStep {
    /// Single solve on the unperturbed costs.
    Solve,
    /// Noisy-edge and random-terminal repetitions.
    Ensemble,
    /// Robustness filter over the ensemble union, or the solved forest when
    /// no ensemble ran.
    Consensus,
    /// Louvain communities of the consensus network.
    Communities,
    /// Node attribute table.
    Annotate,
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStep::Solve => "solve",
            PipelineStep::Ensemble => "ensemble",
            PipelineStep::Consensus => "consensus",
            PipelineStep::Communities => "communities",
            PipelineStep::Annotate => "annotate",
        };
        write!(f, "{}", name)
    }
}

/// Drives a configured run over one interactome and prize assignment.
#[derive(Debug, Clone, Default)]
pub struct NetworkPipeline {
    config: PcsfConfig,
}

/// Headline numbers of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub name: String,
    /// RFC 3339 completion time.
    pub timestamp: String,
    pub params: PcsfParams,
    pub interactome_nodes: usize,
    pub interactome_edges: usize,
    pub rejected_edges: usize,
    pub n_terminals: usize,
    pub dropped_seeds: usize,
    pub forest_nodes: usize,
    pub forest_edges: usize,
    pub forest_trees: usize,
    pub objective: f64,
    pub noisy_edge_runs: Option<RunTally>,
    pub random_terminal_runs: Option<RunTally>,
    pub consensus_nodes: usize,
    pub consensus_edges: usize,
    pub n_communities: usize,
    pub modularity: f64,
    pub interrupted: bool,
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkResult {
    pub forest: Forest,
    pub ensemble: Option<EnsembleResult>,
    pub consensus: ConsensusNetwork,
    pub communities: Vec<Community>,
    pub annotations: Vec<NodeAnnotation>,
    pub summary: RunSummary,
}

impl NetworkPipeline {
    pub fn new(config: PcsfConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PcsfConfig {
        &self.config
    }

    /// Steps in execution order.
    pub fn steps(&self) -> Vec<PipelineStep> {
        let mut steps = vec![PipelineStep::Solve];
        if self.config.ensemble.is_some() {
            steps.push(PipelineStep::Ensemble);
        }
        steps.extend([
            PipelineStep::Consensus,
            PipelineStep::Communities,
            PipelineStep::Annotate,
        ]);
        steps
    }

    /// Run the pipeline.
    pub fn run(&self, interactome: &Interactome, prizes: &NodePrizes) -> Result<NetworkResult> {
        self.run_interruptible(interactome, prizes, &AtomicBool::new(false))
    }

    /// Run the pipeline; an interrupt stops the ensemble early and the
    /// remaining steps use the partial frequencies.
    pub fn run_interruptible(
        &self,
        interactome: &Interactome,
        prizes: &NodePrizes,
        interrupt: &AtomicBool,
    ) -> Result<NetworkResult> {
        self.config.validate()?;
        let graph = AugmentedGraph::new(interactome, &self.config.params)?;
        let mut state = PipelineState::new(graph, prizes);

        for (i, step) in self.steps().iter().enumerate() {
            info!("Step {}: {}", i + 1, step);
            state = state.apply(*step, &self.config, interrupt).map_err(|e| {
                PcsfError::Pipeline(format!("Step {} ({}) failed: {}", i + 1, step, e))
            })?;
        }

        state.finalize(&self.config)
    }
}

/// Internal state during pipeline execution.
struct PipelineState<'a> {
    graph: AugmentedGraph<'a>,
    prizes: &'a NodePrizes,
    forest: Option<Forest>,
    ensemble: Option<EnsembleResult>,
    consensus: Option<ConsensusNetwork>,
    communities: Option<Vec<Community>>,
    annotations: Option<Vec<NodeAnnotation>>,
}

impl<'a> PipelineState<'a> {
    fn new(graph: AugmentedGraph<'a>, prizes: &'a NodePrizes) -> Self {
        Self {
            graph,
            prizes,
            forest: None,
            ensemble: None,
            consensus: None,
            communities: None,
            annotations: None,
        }
    }

    fn apply(
        mut self,
        step: PipelineStep,
        config: &PcsfConfig,
        interrupt: &AtomicBool,
    ) -> Result<Self> {
        let interactome = self.graph.interactome();
        match step {
            PipelineStep::Solve => {
                self.forest = Some(solve(&self.graph, self.prizes, config.params.b)?);
            }
            PipelineStep::Ensemble => {
                let ensemble_config = config.ensemble.as_ref().ok_or_else(|| {
                    PcsfError::Pipeline("ensemble step without ensemble settings".to_string())
                })?;
                self.ensemble = Some(run_ensemble_interruptible(
                    &self.graph,
                    self.prizes,
                    &config.params,
                    ensemble_config,
                    interrupt,
                )?);
            }
            PipelineStep::Consensus => {
                let network = match (&self.ensemble, &self.forest) {
                    (Some(ensemble), _) => {
                        ConsensusNetwork::filter(interactome, ensemble, config.consensus_threshold)?
                    }
                    (None, Some(forest)) => ConsensusNetwork::from_forest(interactome, forest),
                    (None, None) => {
                        return Err(PcsfError::Pipeline(
                            "Must solve before building the consensus network".to_string(),
                        ))
                    }
                };
                self.consensus = Some(network);
            }
            PipelineStep::Communities => {
                let network = self.consensus.as_ref().ok_or_else(|| {
                    PcsfError::Pipeline("Must build consensus before communities".to_string())
                })?;
                self.communities = Some(partition(network, &config.community)?);
            }
            PipelineStep::Annotate => {
                let network = self.consensus.as_ref().ok_or_else(|| {
                    PcsfError::Pipeline("Must build consensus before annotation".to_string())
                })?;
                let communities = self.communities.as_deref().unwrap_or(&[]);
                self.annotations = Some(annotate_nodes(
                    interactome,
                    self.prizes,
                    network,
                    communities,
                ));
            }
        }
        Ok(self)
    }

    fn finalize(self, config: &PcsfConfig) -> Result<NetworkResult> {
        let forest = self
            .forest
            .ok_or_else(|| PcsfError::Pipeline("No forest was solved".to_string()))?;
        let consensus = self
            .consensus
            .ok_or_else(|| PcsfError::Pipeline("No consensus network was built".to_string()))?;
        let communities = self.communities.unwrap_or_default();
        let annotations = self.annotations.unwrap_or_default();
        let interactome = self.graph.interactome();

        let summary = RunSummary {
            name: config.name.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            params: config.params.clone(),
            interactome_nodes: interactome.n_nodes(),
            interactome_edges: interactome.n_edges(),
            rejected_edges: interactome.rejected_edges(),
            n_terminals: self.prizes.n_terminals(),
            dropped_seeds: self.prizes.dropped_seeds().len(),
            forest_nodes: forest.n_nodes(),
            forest_edges: forest.n_edges(),
            forest_trees: forest.n_components(interactome),
            objective: forest.objective(&self.graph, self.prizes, config.params.b),
            noisy_edge_runs: self.ensemble.as_ref().map(|e| e.noisy_edge_runs.clone()),
            random_terminal_runs: self
                .ensemble
                .as_ref()
                .map(|e| e.random_terminal_runs.clone()),
            consensus_nodes: consensus.n_nodes(),
            consensus_edges: consensus.n_edges(),
            n_communities: communities.len(),
            modularity: modularity(&consensus, &communities, config.community.resolution),
            interrupted: self.ensemble.as_ref().is_some_and(|e| e.interrupted),
        };
        info!(
            "Run '{}' finished: {} consensus nodes, {} communities",
            summary.name, summary.consensus_nodes, summary.n_communities
        );

        Ok(NetworkResult {
            forest,
            ensemble: self.ensemble,
            consensus,
            communities,
            annotations,
            summary,
        })
    }
}

impl NetworkResult {
    /// Export the summary as JSON.
    pub fn summary_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.summary).map_err(PcsfError::from)
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "PCSF Run: {}", self.name)?;
        writeln!(f, "==========={}", "=".repeat(self.name.len()))?;
        writeln!(f, "Finished: {}", self.timestamp)?;
        writeln!(
            f,
            "Parameters: w={} b={} g={} noise={} dummy={}",
            self.params.w, self.params.b, self.params.g, self.params.edge_noise, self.params.dummy_mode
        )?;
        writeln!(
            f,
            "Interactome: {} nodes, {} edges ({} rows rejected)",
            self.interactome_nodes, self.interactome_edges, self.rejected_edges
        )?;
        writeln!(
            f,
            "Terminals: {} ({} seeds not in interactome)",
            self.n_terminals, self.dropped_seeds
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "Forest: {} nodes, {} edges, {} trees (objective {:.4})",
            self.forest_nodes, self.forest_edges, self.forest_trees, self.objective
        )?;
        if let Some(runs) = &self.noisy_edge_runs {
            writeln!(
                f,
                "Noisy-edge runs: {}/{} completed",
                runs.completed, runs.requested
            )?;
        }
        if let Some(runs) = &self.random_terminal_runs {
            if runs.requested > 0 {
                writeln!(
                    f,
                    "Random-terminal runs: {}/{} completed",
                    runs.completed, runs.requested
                )?;
            }
        }
        if self.interrupted {
            writeln!(f, "WARNING: ensemble was interrupted")?;
        }
        writeln!(
            f,
            "Consensus: {} nodes, {} edges",
            self.consensus_nodes, self.consensus_edges
        )?;
        writeln!(
            f,
            "Communities: {} (modularity {:.3})",
            self.n_communities, self.modularity
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::EnsembleConfig;
    use std::sync::atomic::Ordering;

    fn ladder() -> Interactome {
        Interactome::from_edges(vec![
            ("A", "B", 0.1),
            ("B", "C", 0.2),
            ("C", "D", 0.1),
            ("A", "D", 0.9),
            ("D", "E", 0.05),
            ("E", "F", 0.3),
        ])
        .unwrap()
    }

    fn prizes(g: &Interactome) -> NodePrizes {
        let mut prizes = vec![0.0; g.n_nodes()];
        for name in ["A", "C", "F"] {
            prizes[g.node_id(name).unwrap()] = 5.0;
        }
        NodePrizes::from_prizes(prizes)
    }

    fn config() -> PcsfConfig {
        PcsfConfig::quick().with_params(PcsfParams::new(0.5, 1.0).with_g(0.0).with_edge_noise(0.0))
    }

    #[test]
    fn test_steps() {
        let with_ensemble = NetworkPipeline::new(config());
        assert_eq!(with_ensemble.steps().len(), 5);
        assert_eq!(with_ensemble.steps()[1], PipelineStep::Ensemble);

        let single = NetworkPipeline::new(config().with_ensemble(None));
        assert_eq!(
            single.steps(),
            vec![
                PipelineStep::Solve,
                PipelineStep::Consensus,
                PipelineStep::Communities,
                PipelineStep::Annotate
            ]
        );
    }

    #[test]
    fn test_run_with_noise_free_ensemble() {
        let g = ladder();
        let p = prizes(&g);
        let result = NetworkPipeline::new(config()).run(&g, &p).unwrap();

        assert_eq!(result.forest.edges(), &[0, 1, 2, 4, 5]);
        assert_eq!(result.consensus.n_nodes(), 6);
        assert!(result.consensus.nodes.iter().all(|n| n.robustness == 1.0));
        assert_eq!(result.annotations.len(), 6);
        assert_eq!(result.summary.forest_trees, 1);
        assert_eq!(result.summary.n_terminals, 3);
        assert!(result.communities.iter().all(|c| c.len() >= 3));
        assert!(result.summary_json().unwrap().contains("\"consensus_nodes\": 6"));
    }

    #[test]
    fn test_run_without_ensemble() {
        let g = ladder();
        let p = prizes(&g);
        let result = NetworkPipeline::new(config().with_ensemble(None))
            .run(&g, &p)
            .unwrap();
        assert!(result.ensemble.is_none());
        assert_eq!(result.consensus.edge_ids(), vec![0, 1, 2, 4, 5]);
        assert!(result.summary.noisy_edge_runs.is_none());
        assert!(result.summary.to_string().contains("Forest: 6 nodes, 5 edges, 1 trees"));
    }

    #[test]
    fn test_invalid_config_rejected_before_solving() {
        let g = ladder();
        let p = prizes(&g);
        let bad = config().with_consensus_threshold(2.0);
        assert!(matches!(
            NetworkPipeline::new(bad).run(&g, &p),
            Err(PcsfError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_interrupted_ensemble_wrapped() {
        let g = ladder();
        let p = prizes(&g);
        let interrupt = AtomicBool::new(false);
        interrupt.store(true, Ordering::SeqCst);
        let pipeline = NetworkPipeline::new(
            config().with_ensemble(Some(EnsembleConfig::default().with_noisy_edge_reps(5))),
        );
        // Nothing completes, so consensus has no runs to filter.
        assert!(matches!(
            pipeline.run_interruptible(&g, &p, &interrupt),
            Err(PcsfError::Pipeline(_))
        ));
    }
}
