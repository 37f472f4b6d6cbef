// Licensed under the Apache License, Version 2.0 (the "License"); you may
// not use this file except in compliance with the License. You may obtain
// a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations
// under the License.

//! Newman's leading eigenvector method.
//!
//! Communities are split in two by the sign pattern of the leading
//! eigenvector of their generalized modularity matrix
//! `B(g)_ij = A_ij - k_i k_j / 2m - delta_ij sum_{l in g} (A_il - k_i k_l / 2m)`.
//! A community is left alone when the leading eigenvalue is not positive
//! or when the split would not increase modularity.
//!
//! Reference: M. E. J. Newman, "Finding community structure in networks
//! using the eigenvectors of matrices", Phys. Rev. E 74, 036104 (2006).

use std::collections::VecDeque;

use ndarray::{Array1, Array2};

use super::Partition;
use crate::common::relabel;
use crate::error::{Error, Result};
use crate::graph::{Adjacency, Graph};
use crate::modularity::modularity;
use crate::progress::{Progress, ProgressHandler};

const EIGENVALUE_EPS: f64 = 1e-8;
const GAIN_EPS: f64 = 1e-10;

/// Split communities recursively until none can be divided, at most
/// `n - 1` times. Each eigenvector comes from a dense Jacobi
/// diagonalization of at most `max_sweeps` sweeps; running out of sweeps
/// fails with [`Error::NotConverged`].
pub fn leading_eigenvector(
    graph: &Graph,
    max_sweeps: usize,
    progress: &mut dyn ProgressHandler,
) -> Result<Partition> {
    let adj = Adjacency::new(graph);
    let n = adj.len();
    let mut progress = Progress::new(progress, "leading eigenvector");

    if adj.two_m() == 0.0 {
        progress.finish();
        let membership: Vec<usize> = (0..n).collect();
        return Ok(Partition {
            membership,
            modularity: 0.0,
        });
    }

    let mut communities: Vec<Vec<usize>> = vec![(0..n).collect()];
    let mut pending: VecDeque<usize> = VecDeque::from([0]);
    let max_splits = n.saturating_sub(1);
    let mut splits = 0;

    while let Some(ci) = pending.pop_front() {
        if splits >= max_splits {
            break;
        }
        let members = communities[ci].clone();
        if members.len() < 2 {
            continue;
        }
        let b = modularity_matrix(&adj, &members);
        let (lambda, x) = leading_eigenpair(&b, max_sweeps)?;
        if lambda <= EIGENVALUE_EPS {
            continue;
        }
        let s: Array1<f64> = x.mapv(|v| if v > 0.0 { 1.0 } else { -1.0 });
        let positive = s.iter().filter(|&&v| v > 0.0).count();
        if positive == 0 || positive == members.len() {
            continue;
        }
        let gain = s.dot(&b.dot(&s)) / (2.0 * adj.two_m());
        if gain <= GAIN_EPS {
            continue;
        }

        let (inside, outside): (Vec<(usize, f64)>, Vec<(usize, f64)>) = members
            .iter()
            .copied()
            .zip(s.iter().copied())
            .partition(|&(_, side)| side < 0.0);
        communities[ci] = inside.into_iter().map(|(v, _)| v).collect();
        communities.push(outside.into_iter().map(|(v, _)| v).collect());
        pending.push_back(ci);
        pending.push_back(communities.len() - 1);
        splits += 1;
        progress.update(splits, max_splits);
    }
    progress.finish();

    let mut membership = vec![0; n];
    for (c, members) in communities.iter().enumerate() {
        for &v in members {
            membership[v] = c;
        }
    }
    let membership = relabel(&membership);
    let q = modularity(graph, &membership)?;
    Ok(Partition {
        membership,
        modularity: q,
    })
}

/// Generalized modularity matrix of the community `members`.
fn modularity_matrix(adj: &Adjacency, members: &[usize]) -> Array2<f64> {
    let s = members.len();
    let two_m = adj.two_m();
    let mut local = vec![usize::MAX; adj.len()];
    for (i, &v) in members.iter().enumerate() {
        local[v] = i;
    }

    let mut b = Array2::zeros((s, s));
    for (i, &u) in members.iter().enumerate() {
        for &v in &adj.neighbors[u] {
            let j = local[v];
            if j != usize::MAX {
                b[[i, j]] += 1.0;
            }
        }
        for (j, &v) in members.iter().enumerate() {
            b[[i, j]] -= adj.degree[u] * adj.degree[v] / two_m;
        }
    }
    for i in 0..s {
        let row_sum = b.row(i).sum();
        b[[i, i]] -= row_sum;
    }
    b
}

/// Largest algebraic eigenvalue and its unit eigenvector.
///
/// Cyclic Jacobi rotations diagonalize a copy of `b`; the off-diagonal
/// mass must fall below `1e-12` of the Frobenius norm within `max_sweeps`
/// sweeps. The first largest diagonal entry wins.
fn leading_eigenpair(b: &Array2<f64>, max_sweeps: usize) -> Result<(f64, Array1<f64>)> {
    let n = b.nrows();
    let mut a = b.clone();
    let mut v: Array2<f64> = Array2::eye(n);
    let tolerance = 1e-12 * b.iter().map(|x| x * x).sum::<f64>().sqrt();

    let mut sweeps = 0;
    while off_diagonal_norm(&a) > tolerance {
        if sweeps == max_sweeps {
            return Err(Error::NotConverged {
                algorithm: "leading eigenvector",
                iterations: max_sweeps,
            });
        }
        for p in 0..n.saturating_sub(1) {
            for q in (p + 1)..n {
                rotate(&mut a, &mut v, p, q);
            }
        }
        sweeps += 1;
    }

    let mut best = 0;
    for i in 1..n {
        if a[[i, i]] > a[[best, best]] {
            best = i;
        }
    }
    Ok((a[[best, best]], v.column(best).to_owned()))
}

fn off_diagonal_norm(a: &Array2<f64>) -> f64 {
    let n = a.nrows();
    let mut sum = 0.0;
    for p in 0..n {
        for q in (p + 1)..n {
            sum += a[[p, q]] * a[[p, q]];
        }
    }
    sum.sqrt()
}

/// Zero `a[p, q]` with one rotation, accumulating it into `v`.
fn rotate(a: &mut Array2<f64>, v: &mut Array2<f64>, p: usize, q: usize) {
    let apq = a[[p, q]];
    if apq == 0.0 {
        return;
    }
    let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
    let c = 1.0 / (t * t + 1.0).sqrt();
    let s = t * c;

    let n = a.nrows();
    for k in 0..n {
        let (akp, akq) = (a[[k, p]], a[[k, q]]);
        a[[k, p]] = c * akp - s * akq;
        a[[k, q]] = s * akp + c * akq;
    }
    for k in 0..n {
        let (apk, aqk) = (a[[p, k]], a[[q, k]]);
        a[[p, k]] = c * apk - s * aqk;
        a[[q, k]] = s * apk + c * aqk;
    }
    for k in 0..n {
        let (vkp, vkq) = (v[[k, p]], v[[k, q]]);
        v[[k, p]] = c * vkp - s * vkq;
        v[[k, q]] = s * vkp + c * vkq;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::test_graphs;

    #[test]
    fn test_two_triangles() {
        let g = test_graphs::two_triangles();
        let p = leading_eigenvector(&g, 100, &mut NoProgress).unwrap();
        assert_eq!(p.membership, vec![0, 0, 0, 1, 1, 1]);
        assert!((p.modularity - 5.0 / 14.0).abs() < 1e-12);
    }

    #[test]
    fn test_karate_quality() {
        let g = test_graphs::karate();
        let p = leading_eigenvector(&g, 100, &mut NoProgress).unwrap();
        assert!((p.modularity - 0.3934).abs() < 1e-4, "q = {}", p.modularity);
        assert!((p.modularity - modularity(&g, &p.membership).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn test_rows_of_generalized_matrix_sum_to_zero() {
        let g = test_graphs::karate();
        let adj = Adjacency::new(&g);
        let members: Vec<usize> = (0..17).collect();
        let b = modularity_matrix(&adj, &members);
        for row in b.rows() {
            assert!(row.sum().abs() < 1e-12);
        }
    }

    #[test]
    fn test_eigenpair_of_diagonal_matrix() {
        let b = ndarray::arr2(&[[2.0, 0.0, 0.0], [0.0, -5.0, 0.0], [0.0, 0.0, 1.0]]);
        let (lambda, x) = leading_eigenpair(&b, 0).unwrap();
        assert_eq!(lambda, 2.0);
        assert_eq!(x.to_vec(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_eigenpair_residual() {
        let b = ndarray::arr2(&[[2.0, 1.0, 0.5], [1.0, -1.0, 0.0], [0.5, 0.0, 3.0]]);
        let (lambda, x) = leading_eigenpair(&b, 100).unwrap();
        let residual = &b.dot(&x) - &(&x * lambda);
        assert!(residual.iter().all(|r| r.abs() < 1e-10));
        assert!((x.dot(&x) - 1.0).abs() < 1e-12);
        assert!(lambda > 3.0);
    }

    #[test]
    fn test_nearly_degenerate_spectrum_splits() {
        let pairs = [
            (0, 3), (0, 5), (0, 6), (0, 12), (1, 2), (1, 5), (1, 8), (1, 9), (1, 10), (1, 11),
            (2, 3), (2, 6), (2, 8), (3, 4), (3, 5), (3, 12), (4, 12), (6, 12), (7, 11), (8, 12),
            (9, 11),
        ];
        let g = crate::graph::from_pairs(13, &pairs).unwrap();
        let p = leading_eigenvector(&g, 100, &mut NoProgress).unwrap();
        assert!(p.membership.iter().any(|&c| c > 0));
        assert!(p.modularity > 0.3, "q = {}", p.modularity);
    }

    #[test]
    fn test_budget_exhaustion_is_an_error() {
        let g = test_graphs::karate();
        assert!(matches!(
            leading_eigenvector(&g, 1, &mut NoProgress),
            Err(Error::NotConverged { .. })
        ));
    }

    #[test]
    fn test_edgeless_graph() {
        let g = crate::graph::from_pairs(3, &[]).unwrap();
        let p = leading_eigenvector(&g, 100, &mut NoProgress).unwrap();
        assert_eq!(p.membership, vec![0, 1, 2]);
        assert_eq!(p.modularity, 0.0);
    }
}
