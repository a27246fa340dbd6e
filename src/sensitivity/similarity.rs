//! Jaccard similarity and edit distance between solutions.

use crate::solver::Forest;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Which element set of a forest to compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Nodes,
    Edges,
}

/// Jaccard index of two sorted, duplicate-free slices. Two empty sets are
/// identical.
pub fn jaccard<T: Ord>(a: &[T], b: &[T]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let shared = n_shared(a, b);
    let union = a.len() + b.len() - shared;
    shared as f64 / union as f64
}

fn n_shared<T: Ord>(a: &[T], b: &[T]) -> usize {
    let (mut i, mut j, mut shared) = (0, 0, 0usize);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                shared += 1;
                i += 1;
                j += 1;
            }
        }
    }
    shared
}

/// Size of the symmetric difference of two sorted, duplicate-free slices.
pub fn symmetric_difference<T: Ord>(a: &[T], b: &[T]) -> usize {
    a.len() + b.len() - 2 * n_shared(a, b)
}

/// Labelled graph edit distance: node and edge insertions plus deletions
/// needed to turn one forest into the other. Node ids are unique labels, so
/// no substitutions or relabelling arise.
pub fn edit_distance(a: &Forest, b: &Forest) -> usize {
    symmetric_difference(a.nodes(), b.nodes()) + symmetric_difference(a.edges(), b.edges())
}

/// Symmetric pairwise edit-distance matrix with a zero diagonal.
pub fn solution_edit_distance(forests: &[&Forest]) -> DMatrix<f64> {
    let n = forests.len();
    let mut matrix = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = edit_distance(forests[i], forests[j]) as f64;
            matrix[(i, j)] = d;
            matrix[(j, i)] = d;
        }
    }
    matrix
}

/// Symmetric pairwise Jaccard matrix with a unit diagonal.
pub fn solution_similarity(forests: &[&Forest], metric: SimilarityMetric) -> DMatrix<f64> {
    let n = forests.len();
    let set = |f: &Forest| -> Vec<usize> {
        match metric {
            SimilarityMetric::Nodes => f.nodes().to_vec(),
            SimilarityMetric::Edges => f.edges().to_vec(),
        }
    };
    let sets: Vec<Vec<usize>> = forests.iter().map(|f| set(*f)).collect();

    let mut matrix = DMatrix::from_element(n, n, 1.0);
    for i in 0..n {
        for j in (i + 1)..n {
            let s = jaccard(&sets[i], &sets[j]);
            matrix[(i, j)] = s;
            matrix[(j, i)] = s;
        }
    }
    matrix
}

/// Tab-separated matrix with row and column labels.
pub fn matrix_to_tsv(matrix: &DMatrix<f64>, labels: &[String]) -> String {
    let mut out = String::new();
    out.push_str("solution");
    for label in labels {
        out.push('\t');
        out.push_str(label);
    }
    out.push('\n');
    for (i, label) in labels.iter().enumerate() {
        out.push_str(label);
        for j in 0..matrix.ncols() {
            out.push_str(&format!("\t{:.4}", matrix[(i, j)]));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jaccard() {
        assert_eq!(jaccard::<usize>(&[], &[]), 1.0);
        assert_eq!(jaccard(&[1, 2], &[]), 0.0);
        assert!((jaccard(&[1, 2, 3], &[2, 3, 4]) - 0.5).abs() < 1e-12);
        assert_eq!(jaccard(&[1, 2], &[1, 2]), 1.0);
    }

    #[test]
    fn test_solution_similarity() {
        let a = Forest::new(vec![0, 1, 2], vec![0, 1]);
        let b = Forest::new(vec![1, 2, 3], vec![1]);
        let c = Forest::empty();
        let nodes = solution_similarity(&[&a, &b, &c], SimilarityMetric::Nodes);
        assert_eq!(nodes.nrows(), 3);
        assert!((nodes[(0, 1)] - 0.5).abs() < 1e-12);
        assert_eq!(nodes[(1, 0)], nodes[(0, 1)]);
        assert_eq!(nodes[(2, 2)], 1.0);
        assert_eq!(nodes[(0, 2)], 0.0);

        let edges = solution_similarity(&[&a, &b], SimilarityMetric::Edges);
        assert!((edges[(0, 1)] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_difference() {
        assert_eq!(symmetric_difference::<usize>(&[], &[]), 0);
        assert_eq!(symmetric_difference(&[1, 2, 3], &[2, 3, 4]), 2);
        assert_eq!(symmetric_difference(&[1, 2], &[]), 2);
        assert_eq!(symmetric_difference(&[5], &[5]), 0);
    }

    #[test]
    fn test_solution_edit_distance() {
        // nodes {0,1,2} vs {1,2,3} differ by 0 and 3; edges {0,1} vs {1} by 0
        let a = Forest::new(vec![0, 1, 2], vec![0, 1]);
        let b = Forest::new(vec![1, 2, 3], vec![1]);
        let c = Forest::empty();
        assert_eq!(edit_distance(&a, &b), 3);
        assert_eq!(edit_distance(&b, &a), 3);

        let distance = solution_edit_distance(&[&a, &b, &c]);
        assert_eq!(distance.nrows(), 3);
        assert_eq!(distance[(0, 1)], 3.0);
        assert_eq!(distance[(1, 0)], 3.0);
        assert_eq!(distance[(0, 2)], 5.0);
        assert_eq!(distance[(1, 2)], 4.0);
        for i in 0..3 {
            assert_eq!(distance[(i, i)], 0.0);
        }

        let tsv = matrix_to_tsv(&distance, &["a".into(), "b".into(), "c".into()]);
        assert_eq!(tsv.lines().nth(1), Some("a\t0.0000\t3.0000\t5.0000"));
    }

    #[test]
    fn test_matrix_to_tsv() {
        let matrix = DMatrix::from_row_slice(2, 2, &[1.0, 0.25, 0.25, 1.0]);
        let tsv = matrix_to_tsv(&matrix, &["x".into(), "y".into()]);
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines[0], "solution\tx\ty");
        assert_eq!(lines[1], "x\t1.0000\t0.2500");
        assert_eq!(lines.len(), 3);
    }
}
