//! Tab-separated writers for solved networks.

use crate::analysis::NodeAnnotation;
use crate::community::Community;
use crate::ensemble::ConsensusNetwork;
use crate::error::Result;
use crate::graph::{AugmentedGraph, NodeId};
use crate::io::IdMap;
use crate::solver::Forest;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn label<'a>(name: &'a str, id_map: Option<&'a IdMap>) -> &'a str {
    match id_map {
        Some(map) => map.to_symbol(name),
        None => name,
    }
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "NA".to_string(), |v| format!("{:.6}", v))
}

/// Write the node attribute table.
pub fn write_nodes_tsv<P: AsRef<Path>>(
    path: P,
    annotations: &[NodeAnnotation],
    id_map: Option<&IdMap>,
) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(
        writer,
        "name\tdisplay_name\tprize\tscore\tterminal\tdegree_centrality\tbetweenness\teigenvector\tcommunity\trobustness\tspecificity"
    )?;

    for a in annotations {
        let display = a
            .display_name
            .as_deref()
            .unwrap_or_else(|| label(&a.name, id_map));
        writeln!(
            writer,
            "{}\t{}\t{:.6}\t{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{}\t{:.4}\t{}",
            a.name,
            display,
            a.prize,
            optional(a.score),
            a.terminal,
            a.degree_centrality,
            a.betweenness,
            a.eigenvector,
            a.community.map_or_else(|| "NA".to_string(), |c| c.to_string()),
            a.robustness,
            optional(a.specificity),
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the edge table: endpoints, input cost, solver cost and robustness.
pub fn write_edges_tsv<P: AsRef<Path>>(
    path: P,
    graph: &AugmentedGraph,
    network: &ConsensusNetwork,
    id_map: Option<&IdMap>,
) -> Result<()> {
    let interactome = graph.interactome();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "protein1\tprotein2\tcost\tsolver_cost\trobustness")?;
    for edge in &network.edges {
        writeln!(
            writer,
            "{}\t{}\t{:.6}\t{:.6}\t{:.4}",
            label(interactome.name(edge.source), id_map),
            label(interactome.name(edge.target), id_map),
            interactome.edge(edge.id).cost,
            graph.cost(edge.id),
            edge.robustness
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a single solved forest as an edge list tagged with the tree each
/// edge belongs to, plus isolated nodes on rows of their own.
pub fn write_forest_tsv<P: AsRef<Path>>(
    path: P,
    graph: &AugmentedGraph,
    forest: &Forest,
    id_map: Option<&IdMap>,
) -> Result<()> {
    let interactome = graph.interactome();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let trees = forest.component_labels(interactome);
    let tree_of = |node: NodeId| {
        forest
            .nodes()
            .binary_search(&node)
            .map(|i| trees[i].to_string())
            .unwrap_or_default()
    };

    writeln!(writer, "protein1\tprotein2\tcost\ttree")?;
    for &edge_id in forest.edges() {
        let edge = interactome.edge(edge_id);
        writeln!(
            writer,
            "{}\t{}\t{:.6}\t{}",
            label(interactome.name(edge.source), id_map),
            label(interactome.name(edge.target), id_map),
            graph.cost(edge_id),
            tree_of(edge.source)
        )?;
    }
    for node in forest.singletons(interactome) {
        writeln!(
            writer,
            "{}\t\t\t{}",
            label(interactome.name(node), id_map),
            tree_of(node)
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Write one row per community with its comma-joined members.
pub fn write_communities_tsv<P: AsRef<Path>>(
    path: P,
    graph: &AugmentedGraph,
    communities: &[Community],
    id_map: Option<&IdMap>,
) -> Result<()> {
    let interactome = graph.interactome();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "community\tsize\tmembers")?;
    for community in communities {
        let members: Vec<&str> = community
            .members
            .iter()
            .map(|&m| label(interactome.name(m), id_map))
            .collect();
        writeln!(
            writer,
            "{}\t{}\t{}",
            community.label,
            community.len(),
            members.join(",")
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Write pre-rendered text (JSON, CSV, matrices) to `path`.
pub fn write_text<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(content.as_bytes())?;
    writer.flush()?;
    Ok(())
}
