//! Modularity optimisation with a connectivity refinement.
//!
//! Each level runs greedy local moving, splits every community that is not
//! internally connected, then contracts the refined communities into single
//! nodes. Levels repeat until no two nodes merge. Because only connected
//! groups are ever contracted, every final community is connected.

use std::collections::{BTreeMap, HashMap};

const MAX_SWEEPS: usize = 100;
const GAIN_EPSILON: f64 = 1e-12;

/// Undirected weighted graph with self-loop weights kept apart.
#[derive(Debug, Clone)]
pub struct WeightedGraph {
    adjacency: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
}

impl WeightedGraph {
    /// Build from undirected `(a, b, weight)` triples; `a == b` adds a loop.
    pub fn from_edges(n: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut adjacency = vec![Vec::new(); n];
        let mut self_loops = vec![0.0; n];
        for &(a, b, w) in edges {
            if a == b {
                self_loops[a] += w;
            } else {
                adjacency[a].push((b, w));
                adjacency[b].push((a, w));
            }
        }
        Self {
            adjacency,
            self_loops,
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.adjacency.len()
    }

    /// Weighted degree; a loop counts twice.
    pub fn strength(&self, node: usize) -> f64 {
        self.adjacency[node].iter().map(|(_, w)| w).sum::<f64>() + 2.0 * self.self_loops[node]
    }

    /// Twice the total edge weight.
    pub fn total_strength(&self) -> f64 {
        (0..self.n_nodes()).map(|i| self.strength(i)).sum()
    }

    /// Modularity of `membership` at resolution `gamma`.
    pub fn modularity(&self, membership: &[usize], gamma: f64) -> f64 {
        let m2 = self.total_strength();
        if m2 <= 0.0 {
            return 0.0;
        }
        let mut internal: HashMap<usize, f64> = HashMap::new();
        let mut totals: HashMap<usize, f64> = HashMap::new();
        for i in 0..self.n_nodes() {
            let c = membership[i];
            *totals.entry(c).or_insert(0.0) += self.strength(i);
            let mut inside = 2.0 * self.self_loops[i];
            for &(j, w) in &self.adjacency[i] {
                if membership[j] == c {
                    inside += w;
                }
            }
            *internal.entry(c).or_insert(0.0) += inside;
        }
        totals
            .iter()
            .map(|(c, &tot)| {
                let inside = internal.get(c).copied().unwrap_or(0.0);
                inside / m2 - gamma * (tot / m2).powi(2)
            })
            .sum()
    }
}

/// Renumber labels `0..k` in order of first appearance.
fn relabel(labels: &[usize]) -> Vec<usize> {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    labels
        .iter()
        .map(|&l| {
            let next = mapping.len();
            *mapping.entry(l).or_insert(next)
        })
        .collect()
}

/// Greedy node moves until no move raises modularity.
fn local_moving(graph: &WeightedGraph, gamma: f64) -> Vec<usize> {
    let n = graph.n_nodes();
    let strength: Vec<f64> = (0..n).map(|i| graph.strength(i)).collect();
    let m2: f64 = strength.iter().sum();
    let mut community: Vec<usize> = (0..n).collect();
    if m2 <= 0.0 {
        return community;
    }

    let mut totals = strength.clone();
    for _ in 0..MAX_SWEEPS {
        let mut moved = false;
        for i in 0..n {
            let current = community[i];
            let k_i = strength[i];

            let mut links: BTreeMap<usize, f64> = BTreeMap::new();
            for &(j, w) in &graph.adjacency[i] {
                *links.entry(community[j]).or_insert(0.0) += w;
            }

            totals[current] -= k_i;
            let gain = |c: usize, w_ic: f64| w_ic - gamma * totals[c] * k_i / m2;
            let mut best = current;
            let mut best_gain = gain(current, links.get(&current).copied().unwrap_or(0.0));
            for (&c, &w_ic) in &links {
                let candidate = gain(c, w_ic);
                if candidate > best_gain + GAIN_EPSILON {
                    best = c;
                    best_gain = candidate;
                }
            }
            totals[best] += k_i;

            if best != current {
                community[i] = best;
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }

    relabel(&community)
}

/// Split each community into its connected parts.
fn refine(graph: &WeightedGraph, partition: &[usize]) -> Vec<usize> {
    let n = graph.n_nodes();
    let mut refined = vec![usize::MAX; n];
    let mut next = 0;
    for start in 0..n {
        if refined[start] != usize::MAX {
            continue;
        }
        refined[start] = next;
        let mut stack = vec![start];
        while let Some(v) = stack.pop() {
            for &(u, w) in &graph.adjacency[v] {
                if w > 0.0 && partition[u] == partition[start] && refined[u] == usize::MAX {
                    refined[u] = next;
                    stack.push(u);
                }
            }
        }
        next += 1;
    }
    refined
}

/// Contract each community into one node.
fn aggregate(graph: &WeightedGraph, partition: &[usize], n_communities: usize) -> WeightedGraph {
    let mut between: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    let mut loops = vec![0.0; n_communities];
    for i in 0..graph.n_nodes() {
        let ci = partition[i];
        loops[ci] += graph.self_loops[i];
        for &(j, w) in &graph.adjacency[i] {
            if i >= j {
                continue;
            }
            let cj = partition[j];
            if ci == cj {
                loops[ci] += w;
            } else {
                *between.entry((ci.min(cj), ci.max(cj))).or_insert(0.0) += w;
            }
        }
    }

    let mut edges: Vec<(usize, usize, f64)> = between.into_iter().map(|((a, b), w)| (a, b, w)).collect();
    edges.extend(loops.iter().enumerate().filter(|(_, &w)| w > 0.0).map(|(c, &w)| (c, c, w)));
    WeightedGraph::from_edges(n_communities, &edges)
}

/// Community label per node, numbered `0..k` in order of first member.
pub fn detect(graph: &WeightedGraph, gamma: f64, max_levels: usize) -> Vec<usize> {
    let mut membership: Vec<usize> = (0..graph.n_nodes()).collect();
    let mut current = graph.clone();

    for _ in 0..max_levels {
        let moved = local_moving(&current, gamma);
        let refined = refine(&current, &moved);
        let n_communities = refined.iter().copied().max().map_or(0, |m| m + 1);
        if n_communities == current.n_nodes() {
            break;
        }
        for label in membership.iter_mut() {
            *label = refined[*label];
        }
        current = aggregate(&current, &refined, n_communities);
    }

    relabel(&membership)
}
