//! Randomized ensembles, inclusion frequencies and consensus filtering.

pub mod consensus;
pub mod randomize;
pub mod runner;

pub use consensus::{ConsensusEdge, ConsensusNetwork, ConsensusNode};
pub use runner::{
    run_ensemble, run_ensemble_interruptible, EnsembleConfig, EnsembleResult, EnsembleSummary,
    RunTally,
};
