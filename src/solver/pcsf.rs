//! Prize-collecting Steiner forest heuristic.
//!
//! # Algorithm
//!
//! 1. Attach every terminal to the synthetic root. With `Terminals` (and the
//!    equivalent `All`) wiring the attachment costs `w`; with `Others` it
//!    costs `w` plus the distance to the terminal's nearest non-terminal.
//! 2. Build the metric closure over {root} ∪ terminals with bounded Dijkstra
//!    searches. A closure edge longer than every root attachment cannot
//!    enter the spanning tree, so searches stop at the largest attachment.
//! 3. Kruskal over the closure. Ties are broken by terminal-pair order, real
//!    pairs before root edges.
//! 4. Expand closure edges into interactome paths and take a minimum
//!    spanning tree over their union to break cycles.
//! 5. Net-worth pruning from the root: a subtree is kept only if its scaled
//!    prize, net of the subtrees it keeps itself, exceeds the cost of the
//!    edge attaching it. Zero-prize leaves therefore always go.
//! 6. Drop the root. Terminals hanging directly off it become singletons.
//!
//! The spanning structure does not depend on `b`, so raising `b` can only
//! grow the set of kept nodes.

use crate::error::{PcsfError, Result};
use crate::graph::{AugmentedGraph, DummyMode, EdgeId, NodeId, NodePrizes};
use crate::solver::closure::{bounded_search, SearchTree};
use crate::solver::forest::Forest;
use log::debug;
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeSet, HashMap};

const ROOT: usize = 0;

/// How a terminal reaches the root.
#[derive(Debug, Clone)]
struct RootLink {
    /// Closure cost of the attachment.
    cost: f64,
    /// Node carrying the dummy edge.
    anchor: NodeId,
    /// Interactome path from the terminal to `anchor`.
    path: Vec<EdgeId>,
}

#[derive(Debug, Clone, Copy)]
enum ClosureKind {
    /// Shortest path between terminals `i` and `j` (indices into the
    /// terminal list, `i < j`).
    Pair(usize, usize),
    /// Root attachment of terminal `i`.
    Root(usize),
}

#[derive(Debug, Clone, Copy)]
struct ClosureEdge {
    cost: f64,
    kind: ClosureKind,
}

/// Solve the PCSF for prizes scaled by `b`.
///
/// An empty terminal set yields an empty forest.
pub fn solve(graph: &AugmentedGraph, prizes: &NodePrizes, b: f64) -> Result<Forest> {
    if !b.is_finite() || b <= 0.0 {
        return Err(PcsfError::InvalidParameter(format!(
            "prize multiplier must be finite and > 0, got {}",
            b
        )));
    }
    let interactome = graph.interactome();
    if prizes.n_nodes() != interactome.n_nodes() {
        return Err(PcsfError::InvalidParameter(format!(
            "prize vector has {} entries for {} nodes",
            prizes.n_nodes(),
            interactome.n_nodes()
        )));
    }

    let terminals = prizes.terminals();
    if terminals.is_empty() {
        return Ok(Forest::empty());
    }

    let links = root_links(graph, prizes);
    let bound = links
        .iter()
        .flatten()
        .map(|l| l.cost)
        .fold(f64::NEG_INFINITY, f64::max);
    if !bound.is_finite() {
        debug!("No terminal can reach the root");
        return Ok(Forest::empty());
    }

    let searches: Vec<SearchTree> = terminals
        .iter()
        .map(|&t| bounded_search(graph, t, bound, |_| false))
        .collect();

    let closure = closure_edges(terminals, &searches, &links);
    let selected = kruskal_closure(terminals.len(), &closure);
    debug!(
        "Closure: {} candidate edges, {} selected",
        closure.len(),
        selected.len()
    );

    // Expand into interactome edges plus dummy edges at their anchors.
    let mut real_edges: BTreeSet<EdgeId> = BTreeSet::new();
    let mut anchors: Vec<NodeId> = Vec::new();
    for edge in &selected {
        match edge.kind {
            ClosureKind::Pair(i, j) => {
                if let Some(path) = searches[i].path_edges(terminals[j]) {
                    real_edges.extend(path);
                }
            }
            ClosureKind::Root(i) => {
                if let Some(link) = &links[i] {
                    real_edges.extend(link.path.iter().copied());
                    anchors.push(link.anchor);
                }
            }
        }
    }

    let tree = SteinerTree::spanning(graph, &real_edges, &anchors);
    let forest = tree.prune(prizes, b);
    debug!(
        "Solved forest: {} nodes, {} edges ({} before pruning)",
        forest.n_nodes(),
        forest.n_edges(),
        tree.n_nodes() - 1
    );
    Ok(forest)
}

/// Root attachment per terminal, `None` when the root is unreachable.
fn root_links(graph: &AugmentedGraph, prizes: &NodePrizes) -> Vec<Option<RootLink>> {
    let w = graph.w();
    prizes
        .terminals()
        .iter()
        .map(|&t| match graph.dummy_mode() {
            DummyMode::Terminals | DummyMode::All => Some(RootLink {
                cost: w,
                anchor: t,
                path: Vec::new(),
            }),
            DummyMode::Others => {
                let search = bounded_search(graph, t, f64::INFINITY, |v| !prizes.is_terminal(v));
                let anchor = search.stopped_at()?;
                Some(RootLink {
                    cost: w + search.distance(anchor)?,
                    anchor,
                    path: search.path_edges(anchor)?,
                })
            }
        })
        .collect()
}

fn closure_edges(
    terminals: &[NodeId],
    searches: &[SearchTree],
    links: &[Option<RootLink>],
) -> Vec<ClosureEdge> {
    let mut closure = Vec::new();
    for (i, search) in searches.iter().enumerate() {
        for (j, &target) in terminals.iter().enumerate().skip(i + 1) {
            if let Some(cost) = search.distance(target) {
                closure.push(ClosureEdge {
                    cost,
                    kind: ClosureKind::Pair(i, j),
                });
            }
        }
    }
    for (i, link) in links.iter().enumerate() {
        if let Some(link) = link {
            closure.push(ClosureEdge {
                cost: link.cost,
                kind: ClosureKind::Root(i),
            });
        }
    }
    // Stable: equal costs keep pair order, pairs before root edges.
    closure.sort_by(|a, b| a.cost.total_cmp(&b.cost));
    closure
}

/// Minimum spanning forest of the closure. Vertex 0 is the root,
/// terminal `i` is vertex `i + 1`.
fn kruskal_closure(n_terminals: usize, closure: &[ClosureEdge]) -> Vec<ClosureEdge> {
    let mut uf = UnionFind::new(n_terminals + 1);
    let mut selected = Vec::with_capacity(n_terminals);
    for edge in closure {
        let (a, b) = match edge.kind {
            ClosureKind::Pair(i, j) => (i + 1, j + 1),
            ClosureKind::Root(i) => (ROOT, i + 1),
        };
        if uf.union(a, b) {
            selected.push(*edge);
            if selected.len() == n_terminals {
                break;
            }
        }
    }
    selected
}

/// Spanning tree over the expanded paths, in local indices with the root
/// at 0.
#[derive(Debug)]
struct SteinerTree {
    nodes: Vec<NodeId>,
    /// `(neighbour, cost, edge)`; dummy edges carry `None`.
    adjacency: Vec<Vec<(usize, f64, Option<EdgeId>)>>,
}

impl SteinerTree {
    fn spanning(graph: &AugmentedGraph, real_edges: &BTreeSet<EdgeId>, anchors: &[NodeId]) -> Self {
        let interactome = graph.interactome();
        let mut nodes: Vec<NodeId> = vec![usize::MAX];
        let mut local: HashMap<NodeId, usize> = HashMap::new();
        let mut intern = |node: NodeId, nodes: &mut Vec<NodeId>| -> usize {
            *local.entry(node).or_insert_with(|| {
                nodes.push(node);
                nodes.len() - 1
            })
        };

        let mut candidates: Vec<(usize, usize, f64, Option<EdgeId>)> = Vec::new();
        for &edge in real_edges {
            let e = interactome.edge(edge);
            let a = intern(e.source, &mut nodes);
            let b = intern(e.target, &mut nodes);
            candidates.push((a, b, graph.cost(edge), Some(edge)));
        }
        for &anchor in anchors {
            let a = intern(anchor, &mut nodes);
            candidates.push((ROOT, a, graph.w(), None));
        }
        candidates.sort_by(|x, y| x.2.total_cmp(&y.2));

        let mut uf = UnionFind::new(nodes.len());
        let mut adjacency = vec![Vec::new(); nodes.len()];
        for (a, b, cost, edge) in candidates {
            if uf.union(a, b) {
                adjacency[a].push((b, cost, edge));
                adjacency[b].push((a, cost, edge));
            }
        }

        Self { nodes, adjacency }
    }

    fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn prune(&self, prizes: &NodePrizes, b: f64) -> Forest {
        let n = self.nodes.len();

        // Preorder from the root; parts not attached to it are discarded.
        let mut parent: Vec<Option<(usize, f64, Option<EdgeId>)>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        let mut stack = vec![ROOT];
        visited[ROOT] = true;
        while let Some(v) = stack.pop() {
            order.push(v);
            for &(u, cost, edge) in &self.adjacency[v] {
                if !visited[u] {
                    visited[u] = true;
                    parent[u] = Some((v, cost, edge));
                    stack.push(u);
                }
            }
        }

        let mut net = vec![0.0; n];
        for &v in order.iter().rev() {
            if v != ROOT {
                net[v] += b * prizes.prize(self.nodes[v]);
            }
            if let Some((p, cost, _)) = parent[v] {
                let surplus = net[v] - cost;
                if surplus > 0.0 {
                    net[p] += surplus;
                }
            }
        }

        // A node survives when every edge on its path to the root pays off.
        let mut kept = vec![false; n];
        kept[ROOT] = true;
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        for &v in &order {
            if let Some((p, cost, edge)) = parent[v] {
                if kept[p] && net[v] - cost > 0.0 {
                    kept[v] = true;
                    nodes.push(self.nodes[v]);
                    if let Some(edge) = edge {
                        edges.push(edge);
                    }
                }
            }
        }

        Forest::new(nodes, edges)
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

    fn ladder_prizes(g: &Interactome) -> NodePrizes {
        let mut prizes = vec![0.0; g.n_nodes()];
        for name in ["A", "C", "F"] {
            prizes[g.node_id(name).unwrap()] = 5.0;
        }
        NodePrizes::from_prizes(prizes)
    }

    fn augmented(g: &Interactome, w: f64) -> AugmentedGraph<'_> {
        AugmentedGraph::new(g, &PcsfParams::new(w, 1.0).with_g(0.0)).unwrap()
    }

    #[test]
    fn test_ladder_connects_all_terminals() {
        let g = ladder();
        let aug = augmented(&g, 0.5);
        let forest = solve(&aug, &ladder_prizes(&g), 10.0).unwrap();
        assert_eq!(forest.node_names(&g), vec!["A", "B", "C", "D", "E", "F"]);
        assert_eq!(forest.edges(), &[0, 1, 2, 4, 5]);
        assert!(forest.is_acyclic(&g));
        assert_eq!(forest.n_components(&g), 1);
    }

    #[test]
    fn test_small_w_gives_singletons() {
        let g = ladder();
        let aug = augmented(&g, 0.25);
        let forest = solve(&aug, &ladder_prizes(&g), 1.0).unwrap();
        assert_eq!(forest.node_names(&g), vec!["A", "C", "F"]);
        assert_eq!(forest.n_edges(), 0);
        assert_eq!(forest.singletons(&g).len(), 3);
    }

    #[test]
    fn test_low_prize_terminal_dropped() {
        let g = ladder();
        let aug = augmented(&g, 0.5);
        let mut prizes = vec![0.0; g.n_nodes()];
        prizes[0] = 5.0;
        prizes[5] = 0.2;
        let forest = solve(&aug, &NodePrizes::from_prizes(prizes.clone()), 1.0).unwrap();
        assert_eq!(forest.nodes(), &[0]);

        // F joins once its scaled prize pays for the dummy edge.
        let forest = solve(&aug, &NodePrizes::from_prizes(prizes), 5.0).unwrap();
        assert!(forest.contains_node(5));
    }

    #[test]
    fn test_no_terminals_gives_empty_forest() {
        let g = ladder();
        let aug = augmented(&g, 0.5);
        let forest = solve(&aug, &NodePrizes::from_prizes(vec![0.0; 6]), 1.0).unwrap();
        assert!(forest.is_empty());
    }

    #[test]
    fn test_invalid_inputs() {
        let g = ladder();
        let aug = augmented(&g, 0.5);
        assert!(solve(&aug, &ladder_prizes(&g), 0.0).is_err());
        assert!(solve(&aug, &NodePrizes::from_prizes(vec![1.0]), 1.0).is_err());
    }

    #[test]
    fn test_equal_cost_routes_stay_acyclic() {
        // A reaches C through B or D at equal cost; only one route is kept.
        let g = Interactome::from_edges(vec![
            ("A", "B", 0.1),
            ("B", "C", 0.1),
            ("A", "D", 0.1),
            ("D", "C", 0.1),
            ("C", "E", 0.1),
        ])
        .unwrap();
        let aug = augmented(&g, 1.0);
        let mut prizes = vec![0.0; g.n_nodes()];
        for name in ["A", "C", "E"] {
            prizes[g.node_id(name).unwrap()] = 3.0;
        }
        let forest = solve(&aug, &NodePrizes::from_prizes(prizes), 1.0).unwrap();
        assert!(forest.is_acyclic(&g));
        assert_eq!(forest.n_components(&g), 1);
        assert!(!forest.contains_node(g.node_id("D").unwrap()));
    }

    #[test]
    fn test_others_mode_anchors_through_non_terminal() {
        let g = ladder();
        let params = PcsfParams::new(0.5, 1.0)
            .with_g(0.0)
            .with_dummy_mode(DummyMode::Others);
        let aug = AugmentedGraph::new(&g, &params).unwrap();
        let forest = solve(&aug, &ladder_prizes(&g), 10.0).unwrap();
        assert!(forest.is_acyclic(&g));
        for name in ["A", "C", "F"] {
            assert!(forest.contains_node(g.node_id(name).unwrap()));
        }
    }

    #[test]
    fn test_others_mode_without_non_terminals() {
        let g = Interactome::from_edges(vec![("A", "B", 0.1)]).unwrap();
        let params = PcsfParams::new(1.0, 1.0)
            .with_g(0.0)
            .with_dummy_mode(DummyMode::Others);
        let aug = AugmentedGraph::new(&g, &params).unwrap();
        let forest = solve(&aug, &NodePrizes::from_prizes(vec![2.0, 2.0]), 1.0).unwrap();
        assert!(forest.is_empty());
    }

    #[test]
    fn test_all_mode_matches_terminals_mode() {
        let g = ladder();
        let terminals = solve(&augmented(&g, 0.5), &ladder_prizes(&g), 2.0).unwrap();
        let params = PcsfParams::new(0.5, 1.0)
            .with_g(0.0)
            .with_dummy_mode(DummyMode::All);
        let aug = AugmentedGraph::new(&g, &params).unwrap();
        assert_eq!(solve(&aug, &ladder_prizes(&g), 2.0).unwrap(), terminals);
    }
}
