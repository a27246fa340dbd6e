//! Interaction graph, prizes and the cost transform.

pub mod augment;
pub mod interactome;
pub mod params;
pub mod prizes;

pub use augment::{hub_penalties, AugmentedGraph};
pub use interactome::{EdgeId, EdgeRejection, Interaction, Interactome, InteractomeBuilder, NodeId};
pub use params::{DummyMode, PcsfParams};
pub use prizes::{DeRecord, NodePrizes, PrizeTable, SeedRecord};
