//! Approximate prize-collecting Steiner forest solver.

pub mod closure;
pub mod forest;
pub mod pcsf;

pub use forest::Forest;
pub use pcsf::solve;
