//! Prize-Collecting Steiner Forest (PCSF) Network Inference Library
//!
//! This library infers context-specific subnetworks from a weighted protein
//! interaction network and a set of prized seed proteins.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **graph**: Interactome, prizes, parameters and the cost transform
//! - **solver**: Heuristic prize-collecting Steiner forest solver
//! - **ensemble**: Noisy-edge and random-terminal ensembles, consensus filtering
//! - **community**: Louvain community detection on solved networks
//! - **sensitivity**: (w, b) parameter sweeps and solution similarity
//! - **analysis**: Centralities, node tables and seed path costs
//! - **io**: Table readers and TSV writers
//! - **pipeline**: Run configuration and the top-level driver
//!
//! # Example
//!
//! ```no_run
//! use pcsf_network::prelude::*;
//!
//! let interactome = read_interactome("interactome.tsv").unwrap();
//! let table = read_prizes("prizes.tsv").unwrap();
//! let prizes = NodePrizes::assign(&interactome, &table).unwrap();
//!
//! let config = PcsfConfig::default().with_params(PcsfParams::new(2.0, 5.0));
//! let result = NetworkPipeline::new(config)
//!     .run(&interactome, &prizes)
//!     .unwrap();
//! println!("{}", result.summary);
//! ```

pub mod analysis;
pub mod community;
pub mod ensemble;
pub mod error;
pub mod graph;
pub mod io;
pub mod pipeline;
pub mod sensitivity;
pub mod solver;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::analysis::{
        annotate_nodes, centralities, seed_path_costs, sort_annotations, AnnotationKey,
        Centrality, NodeAnnotation, PathCostConfig, PathCostSummary, PathCosts,
    };
    pub use crate::community::{partition, Community, CommunityConfig};
    pub use crate::ensemble::{
        run_ensemble, run_ensemble_interruptible, ConsensusNetwork, EnsembleConfig,
        EnsembleResult,
    };
    pub use crate::error::{PcsfError, Result};
    pub use crate::graph::{
        AugmentedGraph, DummyMode, Interactome, InteractomeBuilder, NodeId, NodePrizes,
        PcsfParams, PrizeTable, SeedRecord,
    };
    pub use crate::io::{
        read_de_results, read_interactome, read_prizes, write_communities_tsv, write_edges_tsv,
        write_forest_tsv, write_nodes_tsv, IdMap,
    };
    pub use crate::pipeline::{NetworkPipeline, NetworkResult, PcsfConfig, RunSummary};
    pub use crate::sensitivity::{
        run_sensitivity_sweep, solution_edit_distance, SensitivityConfig, SensitivitySweep,
        SimilarityMetric,
    };
    pub use crate::solver::{solve, Forest};
}
