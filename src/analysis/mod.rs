//! Post-solve network analysis: centralities, node tables and seed path
//! costs.

pub mod annotate;
pub mod centrality;
pub mod paths;

pub use annotate::{annotate_nodes, sort_annotations, AnnotationKey, NodeAnnotation};
pub use centrality::{centralities, Centrality};
pub use paths::{seed_path_costs, PathCostConfig, PathCostSummary, PathCosts, SeedPairCost};
