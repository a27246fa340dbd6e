//! Node centralities of a solved network.
//!
//! Parallel edges collapse to one link and weights are ignored, so the values
//! describe the topology of the subnetwork only.

use crate::ensemble::ConsensusNetwork;
use log::warn;
use serde::{Deserialize, Serialize};
use sprs::{CsMat, TriMat};
use std::collections::{HashMap, VecDeque};

const EIGENVECTOR_MAX_ITER: usize = 100;
const EIGENVECTOR_TOL: f64 = 1e-6;

/// Centralities of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Centrality {
    /// Degree divided by `n - 1`.
    pub degree: f64,
    /// Normalised shortest-path betweenness.
    pub betweenness: f64,
    /// Unit-norm principal eigenvector entry.
    pub eigenvector: f64,
}

fn simple_neighbors(network: &ConsensusNetwork) -> Vec<Vec<usize>> {
    let local: HashMap<usize, usize> = network
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id, i))
        .collect();
    let mut neighbors = vec![Vec::new(); network.n_nodes()];
    for edge in &network.edges {
        if let (Some(&a), Some(&b)) = (local.get(&edge.source), local.get(&edge.target)) {
            neighbors[a].push(b);
            neighbors[b].push(a);
        }
    }
    for list in &mut neighbors {
        list.sort_unstable();
        list.dedup();
    }
    neighbors
}

fn degree_centrality(neighbors: &[Vec<usize>]) -> Vec<f64> {
    let n = neighbors.len();
    if n <= 1 {
        return vec![1.0; n];
    }
    let scale = 1.0 / (n - 1) as f64;
    neighbors.iter().map(|l| l.len() as f64 * scale).collect()
}

/// Brandes' algorithm on the unweighted graph.
fn betweenness_centrality(neighbors: &[Vec<usize>]) -> Vec<f64> {
    let n = neighbors.len();
    let mut centrality = vec![0.0; n];

    for source in 0..n {
        let mut order = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0; n];
        let mut dist = vec![usize::MAX; n];
        sigma[source] = 1.0;
        dist[source] = 0;

        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            order.push(v);
            for &w in &neighbors[v] {
                if dist[w] == usize::MAX {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0; n];
        while let Some(w) = order.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != source {
                centrality[w] += delta[w];
            }
        }
    }

    // Each unordered pair was counted from both ends.
    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        for c in &mut centrality {
            *c *= scale;
        }
    }
    centrality
}

/// Power iteration on `A + I` over a CSR adjacency matrix.
fn eigenvector_centrality(neighbors: &[Vec<usize>]) -> Vec<f64> {
    let n = neighbors.len();
    if n == 0 {
        return Vec::new();
    }
    let mut triplets = TriMat::new((n, n));
    for (i, list) in neighbors.iter().enumerate() {
        for &j in list {
            triplets.add_triplet(i, j, 1.0);
        }
    }
    let adjacency: CsMat<f64> = triplets.to_csr();

    let mut x = vec![1.0 / n as f64; n];
    for _ in 0..EIGENVECTOR_MAX_ITER {
        let mut next = x.clone();
        for (row, vec) in adjacency.outer_iterator().enumerate() {
            for (col, &weight) in vec.iter() {
                next[col] += x[row] * weight;
            }
        }
        let norm = next.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut next {
                *v /= norm;
            }
        }
        let change: f64 = next.iter().zip(&x).map(|(a, b)| (a - b).abs()).sum();
        x = next;
        if change < n as f64 * EIGENVECTOR_TOL {
            return x;
        }
    }
    warn!(
        "Eigenvector centrality did not converge in {} iterations",
        EIGENVECTOR_MAX_ITER
    );
    x
}

/// Centralities for every node, aligned with `network.nodes`.
pub fn centralities(network: &ConsensusNetwork) -> Vec<Centrality> {
    let neighbors = simple_neighbors(network);
    let degree = degree_centrality(&neighbors);
    let betweenness = betweenness_centrality(&neighbors);
    let eigenvector = eigenvector_centrality(&neighbors);
    (0..network.n_nodes())
        .map(|i| Centrality {
            degree: degree[i],
            betweenness: betweenness[i],
            eigenvector: eigenvector[i],
        })
        .collect()
}
