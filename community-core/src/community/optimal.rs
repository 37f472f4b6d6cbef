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

use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, Solution, SolverModel, Variable,
};

use super::Partition;
use crate::common::{group_by_labels, relabel};
use crate::error::{Error, Result};
use crate::graph::{edge_pairs, Adjacency, Graph};
use crate::modularity::modularity;
use crate::progress::{Progress, ProgressHandler};

/// Exact modularity maximization.
///
/// A modularity-optimal community never spans two connected components, so
/// each component is solved on its own. Components of at most 10 vertices
/// enumerate every set partition and return
/// the lexicographically first optimum (in vertex order). Larger ones are
/// solved as a clique-partitioning integer program. Components with more
/// than `max_component` vertices are refused with [`Error::TooLarge`]
/// before any work is done.
pub fn optimal_modularity(
    graph: &Graph,
    max_component: usize,
    progress: &mut dyn ProgressHandler,
) -> Result<Partition> {
    let adj = Adjacency::new(graph);
    let n = adj.len();
    let mut progress = Progress::new(progress, "optimal modularity");
    if adj.two_m() == 0.0 {
        progress.finish();
        return Ok(Partition {
            membership: (0..n).collect(),
            modularity: 0.0,
        });
    }

    let component_of = adj.components();
    let components = group_by_labels(&component_of);
    if let Some(largest) = components.iter().map(Vec::len).max() {
        if largest > max_component {
            return Err(Error::TooLarge {
                algorithm: "optimal modularity",
                size: largest,
                limit: max_component,
            });
        }
    }

    let mut local = vec![0; n];
    for members in &components {
        for (i, &v) in members.iter().enumerate() {
            local[v] = i;
        }
    }
    let mut weights: Vec<Vec<Vec<f64>>> = components
        .iter()
        .map(|members| vec![vec![0.0; members.len()]; members.len()])
        .collect();
    for (u, v) in edge_pairs(graph) {
        let w = &mut weights[component_of[u]];
        let (i, j) = (local[u], local[v]);
        w[i][j] += 1.0;
        if i != j {
            w[j][i] += 1.0;
        }
    }

    let mut membership = vec![0; n];
    let mut offset = 0;
    for (c, members) in components.iter().enumerate() {
        let degree: Vec<f64> = members.iter().map(|&v| adj.degree[v]).collect();
        let best = if members.len() <= ENUMERATION_LIMIT {
            Search::new(&weights[c], degree, adj.two_m()).run()
        } else {
            solve_partition_program(&weights[c], &degree, adj.two_m())?
        };
        for (i, &v) in members.iter().enumerate() {
            membership[v] = offset + best[i];
        }
        offset += members.len();
        progress.update(c + 1, components.len());
    }
    progress.finish();

    let membership = relabel(&membership);
    let q = modularity(graph, &membership)?;
    Ok(Partition {
        membership,
        modularity: q,
    })
}

/// Largest component solved by enumerating set partitions.
const ENUMERATION_LIMIT: usize = 10;

/// Position of the pair `{i, j}` in the row-major upper triangle of an
/// `s x s` matrix.
fn pair_index(s: usize, i: usize, j: usize) -> usize {
    let (a, b) = if i < j { (i, j) } else { (j, i) };
    a * s - a * (a + 1) / 2 + (b - a - 1)
}

/// Maximize `sum_{i<j} (A_ij - k_i k_j / 2m) x_ij` over binary
/// co-membership variables.
///
/// A transitivity row `x_ij + x_jk - x_ik <= 1` is only posted up front
/// when `{i, j}` or `{j, k}` has a non-negative weight. Omitted rows that
/// the solution violates are posted and the program is solved again, so
/// the returned pairs always form a partition.
fn solve_partition_program(weights: &[Vec<f64>], degree: &[f64], two_m: f64) -> Result<Vec<usize>> {
    let s = degree.len();
    let weight = |i: usize, j: usize| weights[i][j] - degree[i] * degree[j] / two_m;

    let mut posted = Vec::new();
    let mut omitted = Vec::new();
    for j in 0..s {
        for i in 0..s {
            for k in (i + 1)..s {
                if i == j || k == j {
                    continue;
                }
                if weight(i, j) >= 0.0 || weight(j, k) >= 0.0 {
                    posted.push((i, j, k));
                } else {
                    omitted.push((i, j, k));
                }
            }
        }
    }

    loop {
        let mut vars = ProblemVariables::new();
        let mut x: Vec<Variable> = Vec::with_capacity(s * (s - 1) / 2);
        let mut objective = Expression::with_capacity(s * (s - 1) / 2);
        for i in 0..s {
            for j in (i + 1)..s {
                let v = vars.add(variable().binary());
                objective.add_mul(weight(i, j), v);
                x.push(v);
            }
        }

        let mut model = vars.maximise(objective).using(microlp);
        for &(i, j, k) in &posted {
            let ij = x[pair_index(s, i, j)];
            let jk = x[pair_index(s, j, k)];
            let ik = x[pair_index(s, i, k)];
            model.add_constraint(constraint!(ij + jk - ik <= 1));
        }
        let solution = model.solve().map_err(|e| Error::Solver {
            algorithm: "optimal modularity",
            message: e.to_string(),
        })?;
        let together: Vec<bool> = x.iter().map(|&v| solution.value(v) > 0.5).collect();

        let (violated, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut omitted).into_iter().partition(|&(i, j, k)| {
                together[pair_index(s, i, j)]
                    && together[pair_index(s, j, k)]
                    && !together[pair_index(s, i, k)]
            });
        if violated.is_empty() {
            return Ok(groups_of(&together, s));
        }
        posted.extend(violated);
        omitted = kept;
    }
}

/// Membership from a transitive co-membership relation.
fn groups_of(together: &[bool], s: usize) -> Vec<usize> {
    let mut membership = vec![usize::MAX; s];
    let mut next = 0;
    for i in 0..s {
        if membership[i] != usize::MAX {
            continue;
        }
        membership[i] = next;
        for j in (i + 1)..s {
            if together[pair_index(s, i, j)] {
                membership[j] = next;
            }
        }
        next += 1;
    }
    membership
}

/// Depth-first enumeration of restricted growth strings.
struct Search<'a> {
    weights: &'a [Vec<f64>],
    degree: Vec<f64>,
    two_m: f64,
    assign: Vec<usize>,
    inside: Vec<f64>,
    total: Vec<f64>,
    best: Vec<usize>,
    best_q: f64,
}

impl<'a> Search<'a> {
    fn new(weights: &'a [Vec<f64>], degree: Vec<f64>, two_m: f64) -> Self {
        let s = degree.len();
        Search {
            weights,
            degree,
            two_m,
            assign: vec![0; s],
            inside: vec![0.0; s],
            total: vec![0.0; s],
            best: (0..s).collect(),
            best_q: f64::NEG_INFINITY,
        }
    }

    fn run(mut self) -> Vec<usize> {
        self.visit(0, 0);
        self.best
    }

    fn visit(&mut self, i: usize, used: usize) {
        let s = self.degree.len();
        if i == s {
            let m = self.two_m / 2.0;
            let q: f64 = (0..used)
                .map(|c| self.inside[c] / m - (self.total[c] / self.two_m).powi(2))
                .sum();
            if q > self.best_q + 1e-12 {
                self.best_q = q;
                self.best.copy_from_slice(&self.assign);
            }
            return;
        }
        for c in 0..=used.min(s - 1) {
            let mut added = self.weights[i][i];
            for j in 0..i {
                if self.assign[j] == c {
                    added += self.weights[i][j];
                }
            }
            self.assign[i] = c;
            self.inside[c] += added;
            self.total[c] += self.degree[i];
            self.visit(i + 1, used.max(c + 1));
            self.inside[c] -= added;
            self.total[c] -= self.degree[i];
        }
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
        let p = optimal_modularity(&g, 12, &mut NoProgress).unwrap();
        assert_eq!(p.membership, vec![0, 0, 0, 1, 1, 1]);
        assert!((p.modularity - 5.0 / 14.0).abs() < 1e-12);
    }

    #[test]
    fn test_path_of_four() {
        // {0, 1} {2, 3}: Q = 2 * (1/3 - (3/6)^2) = 1/6
        let g = test_graphs::path(4);
        let p = optimal_modularity(&g, 12, &mut NoProgress).unwrap();
        assert_eq!(p.membership, vec![0, 0, 1, 1]);
        assert!((p.modularity - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_components_are_solved_separately() {
        let g = test_graphs::cliques(3, 4);
        let p = optimal_modularity(&g, 4, &mut NoProgress).unwrap();
        assert_eq!(p.membership, vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn test_beats_every_heuristic() {
        let g = test_graphs::ring_of_cliques(2, 5);
        let p = optimal_modularity(&g, 12, &mut NoProgress).unwrap();
        let fg = crate::community::fast_greedy(&g, None, &mut NoProgress).unwrap();
        let best_fg = fg.modularity.iter().cloned().fold(f64::MIN, f64::max);
        assert!(p.modularity >= best_fg - 1e-12);
    }

    #[test]
    fn test_refuses_large_components() {
        let g = test_graphs::karate();
        assert_eq!(
            optimal_modularity(&g, 12, &mut NoProgress).unwrap_err(),
            Error::TooLarge {
                algorithm: "optimal modularity",
                size: 34,
                limit: 12
            }
        );
    }

    #[test]
    fn test_pair_index_is_dense() {
        let s = 5;
        let mut seen = Vec::new();
        for i in 0..s {
            for j in (i + 1)..s {
                seen.push(pair_index(s, i, j));
                assert_eq!(pair_index(s, i, j), pair_index(s, j, i));
            }
        }
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_program_matches_enumeration() {
        let g = test_graphs::ring_of_cliques(2, 5);
        let adj = Adjacency::new(&g);
        let mut w = vec![vec![0.0; 10]; 10];
        for (u, v) in edge_pairs(&g) {
            w[u][v] += 1.0;
            w[v][u] += 1.0;
        }
        let enumerated = Search::new(&w, adj.degree.clone(), adj.two_m()).run();
        let solved = solve_partition_program(&w, &adj.degree, adj.two_m()).unwrap();
        let q_enum = modularity(&g, &relabel(&enumerated)).unwrap();
        let q_ilp = modularity(&g, &relabel(&solved)).unwrap();
        assert!((q_enum - q_ilp).abs() < 1e-12);
        assert_eq!(relabel(&solved), vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_karate_club_optimum() {
        let g = test_graphs::karate();
        let p = optimal_modularity(&g, 34, &mut NoProgress).unwrap();
        assert_eq!(p.membership.len(), 34);
        assert!((p.modularity - 0.419790).abs() < 1e-5, "q = {}", p.modularity);
        let louvain = crate::community::louvain(&g, None, 1.0, 1e-7, 1, &mut NoProgress).unwrap();
        let best = louvain.modularity.iter().cloned().fold(f64::MIN, f64::max);
        assert!(p.modularity >= best - 1e-12);
    }

    #[test]
    fn test_self_loop() {
        let g = crate::graph::from_pairs(3, &[(0, 0), (0, 1), (1, 2)]).unwrap();
        let p = optimal_modularity(&g, 12, &mut NoProgress).unwrap();
        let q = modularity(&g, &p.membership).unwrap();
        assert!((q - p.modularity).abs() < 1e-12);
    }
}
