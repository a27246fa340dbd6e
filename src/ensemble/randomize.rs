//! Seeded perturbations for ensemble runs.

use crate::error::{PcsfError, Result};
use crate::graph::{Interactome, NodePrizes};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Normal};

/// Floor applied to perturbed edge costs.
pub const MIN_EDGE_COST: f64 = 1e-4;

/// Standard deviation, in degree ranks, of a resampled terminal's position.
pub const RANK_SPREAD: f64 = 10.0;

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// Independent random stream per kind of perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomStream {
    EdgeNoise = 1,
    RandomTerminals = 2,
}

/// RNG for one iteration, a pure function of `(seed, stream, iteration)`.
pub fn iteration_rng(seed: u64, stream: RandomStream, iteration: usize) -> ChaCha20Rng {
    let mixed = seed.wrapping_add((iteration as u64).wrapping_mul(GOLDEN_GAMMA));
    let mut rng = ChaCha20Rng::seed_from_u64(mixed);
    rng.set_stream(stream as u64);
    rng
}

/// Multiply every cost by `1 + U(-noise, noise)`, floored at [`MIN_EDGE_COST`].
pub fn perturb_costs<R: Rng>(costs: &[f64], noise: f64, rng: &mut R) -> Vec<f64> {
    if noise <= 0.0 {
        return costs.to_vec();
    }
    costs
        .iter()
        .map(|&c| (c * (1.0 + rng.gen_range(-noise..=noise))).max(MIN_EDGE_COST))
        .collect()
}

/// Move every terminal's prize to a node of similar degree.
///
/// Nodes are ranked by degree (ties by id). Each terminal's prize goes to the
/// node at rank `round(Normal(rank, RANK_SPREAD))`, clamped to the rank range.
/// When two prizes land on the same node the larger is kept.
pub fn resample_terminals<R: Rng>(
    interactome: &Interactome,
    prizes: &NodePrizes,
    rng: &mut R,
) -> Result<NodePrizes> {
    let n = interactome.n_nodes();
    let degrees = interactome.degrees();
    let mut by_degree: Vec<usize> = (0..n).collect();
    by_degree.sort_by_key(|&node| degrees[node]);
    let mut rank = vec![0usize; n];
    for (r, &node) in by_degree.iter().enumerate() {
        rank[node] = r;
    }

    let max_rank = n.saturating_sub(1) as f64;
    let mut moved = vec![0.0; n];
    for &terminal in prizes.terminals() {
        let normal = Normal::new(rank[terminal] as f64, RANK_SPREAD)
            .map_err(|e| PcsfError::InvalidParameter(format!("rank distribution: {}", e)))?;
        let drawn = normal.sample(rng).round().clamp(0.0, max_rank) as usize;
        let target = by_degree[drawn];
        moved[target] = f64::max(moved[target], prizes.prize(terminal));
    }

    Ok(prizes.with_prizes(moved))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: usize) -> Interactome {
        let names: Vec<String> = (0..n).map(|i| format!("P{}", i)).collect();
        let rows: Vec<(&str, &str, f64)> = names
            .windows(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str(), 0.5))
            .collect();
        Interactome::from_edges(rows).unwrap()
    }

    #[test]
    fn test_iteration_rng_reproducible() {
        let a: Vec<u64> = {
            let mut rng = iteration_rng(42, RandomStream::EdgeNoise, 3);
            (0..4).map(|_| rng.gen()).collect()
        };
        let b: Vec<u64> = {
            let mut rng = iteration_rng(42, RandomStream::EdgeNoise, 3);
            (0..4).map(|_| rng.gen()).collect()
        };
        let c: Vec<u64> = {
            let mut rng = iteration_rng(42, RandomStream::RandomTerminals, 3);
            (0..4).map(|_| rng.gen()).collect()
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_perturb_costs_bounds() {
        let costs = vec![0.5; 200];
        let mut rng = iteration_rng(7, RandomStream::EdgeNoise, 0);
        let noisy = perturb_costs(&costs, 0.2, &mut rng);
        assert_eq!(noisy.len(), 200);
        assert!(noisy.iter().all(|&c| (0.4 - 1e-12..=0.6 + 1e-12).contains(&c)));
        assert!(noisy.iter().any(|&c| (c - 0.5).abs() > 1e-6));
    }

    #[test]
    fn test_perturb_costs_floor_and_zero_noise() {
        let costs = vec![0.0, 1e-6, 0.3];
        let mut rng = iteration_rng(7, RandomStream::EdgeNoise, 0);
        let noisy = perturb_costs(&costs, 0.5, &mut rng);
        assert!(noisy.iter().all(|&c| c >= MIN_EDGE_COST));
        assert_eq!(perturb_costs(&costs, 0.0, &mut rng), costs);
    }

    #[test]
    fn test_resample_terminals_preserves_prize_values() {
        let g = chain(50);
        let mut prizes = vec![0.0; 50];
        prizes[10] = 2.0;
        prizes[40] = 3.0;
        let prizes = NodePrizes::from_prizes(prizes);
        let mut rng = iteration_rng(1, RandomStream::RandomTerminals, 0);
        let moved = resample_terminals(&g, &prizes, &mut rng).unwrap();
        assert!(moved.n_terminals() >= 1 && moved.n_terminals() <= 2);
        for &t in moved.terminals() {
            let p = moved.prize(t);
            assert!(p == 2.0 || p == 3.0);
        }
        assert!(moved.total_prize() <= 5.0 + 1e-12);
    }

    #[test]
    fn test_resample_single_node_rank_range() {
        let g = Interactome::from_edges(vec![("A", "B", 0.1)]).unwrap();
        let prizes = NodePrizes::from_prizes(vec![1.0, 0.0]);
        let mut rng = iteration_rng(9, RandomStream::RandomTerminals, 5);
        let moved = resample_terminals(&g, &prizes, &mut rng).unwrap();
        assert_eq!(moved.n_terminals(), 1);
    }
}
