//! Run configuration and the top-level inference driver.

mod config;
mod runner;

pub use config::PcsfConfig;
pub use runner::{NetworkPipeline, NetworkResult, PipelineStep, RunSummary};
