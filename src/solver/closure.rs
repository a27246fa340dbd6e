//! Bounded single-source shortest paths over transformed costs.

use crate::graph::{AugmentedGraph, EdgeId, NodeId};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

#[derive(Debug, Clone, Copy)]
struct Label {
    dist: f64,
    pred: Option<(NodeId, EdgeId)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct State {
    dist: f64,
    node: NodeId,
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on distance, then on node id.
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Settled nodes of one search with their shortest-path predecessors.
#[derive(Debug, Clone)]
pub struct SearchTree {
    settled: HashMap<NodeId, Label>,
    stopped_at: Option<NodeId>,
}

impl SearchTree {
    /// Shortest distance to `node`, if it was settled within the bound.
    pub fn distance(&self, node: NodeId) -> Option<f64> {
        self.settled.get(&node).map(|l| l.dist)
    }

    /// Node that ended the search early, if any.
    pub fn stopped_at(&self) -> Option<NodeId> {
        self.stopped_at
    }

    /// Edges of the shortest path from the source to `target`.
    pub fn path_edges(&self, target: NodeId) -> Option<Vec<EdgeId>> {
        let mut edges = Vec::new();
        let mut node = target;
        loop {
            let label = self.settled.get(&node)?;
            match label.pred {
                Some((prev, edge)) => {
                    edges.push(edge);
                    node = prev;
                }
                None => break,
            }
        }
        edges.reverse();
        Some(edges)
    }
}

/// Dijkstra from `source`, settling only nodes within `bound`.
///
/// The search ends early right after settling the first node other than the
/// source for which `stop` holds. Ties keep the first path found; nodes are
/// popped in (distance, id) order and neighbours scanned in edge input order,
/// so the result is deterministic.
pub fn bounded_search<F>(graph: &AugmentedGraph, source: NodeId, bound: f64, stop: F) -> SearchTree
where
    F: Fn(NodeId) -> bool,
{
    let interactome = graph.interactome();
    let mut tentative: HashMap<NodeId, Label> = HashMap::new();
    let mut settled: HashMap<NodeId, Label> = HashMap::new();
    let mut heap = BinaryHeap::new();
    let mut stopped_at = None;

    tentative.insert(
        source,
        Label {
            dist: 0.0,
            pred: None,
        },
    );
    heap.push(State {
        dist: 0.0,
        node: source,
    });

    while let Some(State { dist, node }) = heap.pop() {
        if dist > bound {
            break;
        }
        if settled.contains_key(&node) {
            continue;
        }
        let label = match tentative.get(&node) {
            Some(label) if label.dist == dist => *label,
            _ => continue,
        };
        settled.insert(node, label);

        if node != source && stop(node) {
            stopped_at = Some(node);
            break;
        }

        for &(next, edge) in interactome.neighbors(node) {
            if settled.contains_key(&next) {
                continue;
            }
            let candidate = dist + graph.cost(edge);
            if candidate > bound {
                continue;
            }
            let improves = tentative
                .get(&next)
                .map_or(true, |current| candidate < current.dist);
            if improves {
                tentative.insert(
                    next,
                    Label {
                        dist: candidate,
                        pred: Some((node, edge)),
                    },
                );
                heap.push(State {
                    dist: candidate,
                    node: next,
                });
            }
        }
    }

    SearchTree {
        settled,
        stopped_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Interactome, PcsfParams};

    fn ladder() -> Interactome {
        Interactome::from_edges(vec![
            ("A", "B", 0.1),
            ("B", "C", 0.2),
            ("C", "D", 0.1),
            ("A", "D", 0.9),
            ("D", "E", 0.05),
            ("E", "F", 0.3),
        ])
        .unwrap()
    }

    fn augmented(g: &Interactome) -> AugmentedGraph<'_> {
        AugmentedGraph::new(g, &PcsfParams::new(1.0, 1.0).with_g(0.0)).unwrap()
    }

    #[test]
    fn test_unbounded_distances() {
        let g = ladder();
        let aug = augmented(&g);
        let tree = bounded_search(&aug, 0, f64::INFINITY, |_| false);
        assert!((0..6).all(|n| tree.distance(n).is_some()));
        assert!((tree.distance(3).unwrap() - 0.4).abs() < 1e-12);
        assert!((tree.distance(5).unwrap() - 0.75).abs() < 1e-12);
        assert_eq!(tree.path_edges(3).unwrap(), vec![0, 1, 2]);
        assert_eq!(tree.path_edges(0).unwrap(), Vec::<EdgeId>::new());
    }

    #[test]
    fn test_bound_limits_settled_nodes() {
        let g = ladder();
        let aug = augmented(&g);
        let tree = bounded_search(&aug, 0, 0.5, |_| false);
        assert!(tree.distance(4).is_some());
        assert!(tree.distance(5).is_none());
        assert!(tree.path_edges(5).is_none());
    }

    #[test]
    fn test_stop_predicate() {
        let g = ladder();
        let aug = augmented(&g);
        let tree = bounded_search(&aug, 2, f64::INFINITY, |n| n == 0 || n == 5);
        assert_eq!(tree.stopped_at(), Some(0));
        assert!((tree.distance(0).unwrap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_ties_keep_first_path() {
        // Two equal-cost routes from A to D; the one through B is found first.
        let g = Interactome::from_edges(vec![
            ("A", "B", 0.5),
            ("A", "C", 0.5),
            ("B", "D", 0.5),
            ("C", "D", 0.5),
        ])
        .unwrap();
        let aug = augmented(&g);
        let tree = bounded_search(&aug, 0, f64::INFINITY, |_| false);
        assert_eq!(tree.path_edges(3).unwrap(), vec![0, 2]);
    }
}
