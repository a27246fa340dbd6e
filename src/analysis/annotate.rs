//! Node attribute table for a solved network.

use crate::analysis::centrality::centralities;
use crate::community::{community_labels, Community};
use crate::ensemble::ConsensusNetwork;
use crate::graph::{Interactome, NodeId, NodePrizes};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// All attributes attached to one network node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAnnotation {
    pub id: NodeId,
    pub name: String,
    pub display_name: Option<String>,
    pub prize: f64,
    pub score: Option<f64>,
    pub terminal: bool,
    pub degree_centrality: f64,
    pub betweenness: f64,
    pub eigenvector: f64,
    pub community: Option<usize>,
    pub robustness: f64,
    pub specificity: Option<f64>,
}

/// Attribute used to order a node table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKey {
    Name,
    #[default]
    Prize,
    Degree,
    Betweenness,
    Eigenvector,
    Robustness,
    Specificity,
    Community,
}

impl std::str::FromStr for AnnotationKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(AnnotationKey::Name),
            "prize" => Ok(AnnotationKey::Prize),
            "degree" | "degree_centrality" => Ok(AnnotationKey::Degree),
            "betweenness" => Ok(AnnotationKey::Betweenness),
            "eigenvector" => Ok(AnnotationKey::Eigenvector),
            "robustness" => Ok(AnnotationKey::Robustness),
            "specificity" => Ok(AnnotationKey::Specificity),
            "community" => Ok(AnnotationKey::Community),
            other => Err(format!("unknown attribute '{}'", other)),
        }
    }
}

/// Build the node table for `network`, in node id order.
pub fn annotate_nodes(
    interactome: &Interactome,
    prizes: &NodePrizes,
    network: &ConsensusNetwork,
    communities: &[Community],
) -> Vec<NodeAnnotation> {
    let scores = centralities(network);
    let labels = community_labels(communities);
    network
        .nodes
        .iter()
        .zip(scores)
        .map(|(node, centrality)| NodeAnnotation {
            id: node.id,
            name: interactome.name(node.id).to_string(),
            display_name: prizes.display_name(node.id).map(str::to_string),
            prize: prizes.prize(node.id),
            score: prizes.score(node.id),
            terminal: prizes.is_terminal(node.id),
            degree_centrality: centrality.degree,
            betweenness: centrality.betweenness,
            eigenvector: centrality.eigenvector,
            community: labels.get(&node.id).copied(),
            robustness: node.robustness,
            specificity: node.specificity,
        })
        .collect()
}

fn numeric(a: &NodeAnnotation, key: AnnotationKey) -> Option<f64> {
    match key {
        AnnotationKey::Prize => Some(a.prize),
        AnnotationKey::Degree => Some(a.degree_centrality),
        AnnotationKey::Betweenness => Some(a.betweenness),
        AnnotationKey::Eigenvector => Some(a.eigenvector),
        AnnotationKey::Robustness => Some(a.robustness),
        AnnotationKey::Specificity => a.specificity,
        AnnotationKey::Community => a.community.map(|c| c as f64),
        AnnotationKey::Name => None,
    }
}

/// Stable sort by `key`. Missing values sort last in either direction.
pub fn sort_annotations(annotations: &mut [NodeAnnotation], key: AnnotationKey, descending: bool) {
    annotations.sort_by(|a, b| {
        if key == AnnotationKey::Name {
            let ord = a.name.cmp(&b.name);
            return if descending { ord.reverse() } else { ord };
        }
        match (numeric(a, key), numeric(b, key)) {
            (Some(x), Some(y)) => {
                let ord = x.total_cmp(&y);
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::Forest;

    fn setup() -> (Interactome, NodePrizes, ConsensusNetwork) {
        let g = Interactome::from_edges(vec![("A", "B", 0.1), ("B", "C", 0.1), ("C", "D", 0.1)])
            .unwrap();
        let prizes = NodePrizes::from_prizes(vec![3.0, 0.0, 1.0, 2.0]);
        let forest = Forest::new(vec![0, 1, 2, 3], vec![0, 1, 2]);
        let network = ConsensusNetwork::from_forest(&g, &forest);
        (g, prizes, network)
    }

    #[test]
    fn test_annotate_nodes() {
        let (g, prizes, network) = setup();
        let communities = vec![Community {
            label: 0,
            members: vec![0, 1],
        }];
        let table = annotate_nodes(&g, &prizes, &network, &communities);
        assert_eq!(table.len(), 4);
        assert_eq!(table[0].name, "A");
        assert!(table[0].terminal);
        assert!(!table[1].terminal);
        assert_eq!(table[1].community, Some(0));
        assert_eq!(table[2].community, None);
        assert!(table[1].betweenness > table[0].betweenness);
    }

    #[test]
    fn test_sort_annotations() {
        let (g, prizes, network) = setup();
        let mut table = annotate_nodes(&g, &prizes, &network, &[]);
        sort_annotations(&mut table, AnnotationKey::Prize, true);
        let names: Vec<&str> = table.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["A", "D", "C", "B"]);

        sort_annotations(&mut table, AnnotationKey::Name, false);
        assert_eq!(table[0].name, "A");

        // No specificity anywhere: order unchanged.
        sort_annotations(&mut table, AnnotationKey::Specificity, true);
        assert_eq!(table[3].name, "D");
    }

    #[test]
    fn test_key_from_str() {
        assert_eq!("Betweenness".parse::<AnnotationKey>(), Ok(AnnotationKey::Betweenness));
        assert!("bogus".parse::<AnnotationKey>().is_err());
    }
}
