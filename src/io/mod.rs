//! Table readers and writers.

pub mod export;
pub mod idmap;
pub mod tables;

pub use export::{
    write_communities_tsv, write_edges_tsv, write_forest_tsv, write_nodes_tsv, write_text,
};
pub use idmap::IdMap;
pub use tables::{read_de_results, read_interactome, read_prizes};
