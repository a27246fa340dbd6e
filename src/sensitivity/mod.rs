//! Parameter sensitivity analysis.

pub mod similarity;
pub mod sweep;

pub use similarity::{
    edit_distance, jaccard, matrix_to_tsv, solution_edit_distance, solution_similarity,
    symmetric_difference, SimilarityMetric,
};
pub use sweep::{
    generate_parameter_grid, run_sensitivity_sweep, run_sensitivity_sweep_interruptible,
    ParameterPoint, RunStatus, SensitivityConfig, SensitivitySweep, SweepRun,
};
