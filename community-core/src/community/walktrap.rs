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

//! Walktrap clustering (Pons and Latapy).
//!
//! Every vertex gets an extra unit self-loop so that walks can stay put.
//! Clusters are compared through their `steps`-step random walk
//! distributions; at each step the pair of adjacent clusters whose merge
//! increases the within-cluster walk distance the least is merged.

use foldhash::{HashMap, HashMapExt};
use ndarray::Array1;

use crate::agglomeration::{starting_partition, Agglomeration};
use crate::dendrogram::Dendrogram;
use crate::error::Result;
use crate::graph::{Adjacency, Graph};
use crate::progress::{Progress, ProgressHandler};

/// Merge matrix and per-level modularity of a walktrap run.
#[derive(Clone, Debug, PartialEq)]
pub struct WalktrapResult {
    pub dendrogram: Dendrogram,
    /// Modularity before any merge and after each merge, evaluated on the
    /// input graph (without the added self-loops).
    pub modularity: Vec<f64>,
}

pub fn walktrap(
    graph: &Graph,
    steps: usize,
    progress: &mut dyn ProgressHandler,
) -> Result<WalktrapResult> {
    let adj = Adjacency::new(graph);
    let n = adj.len();
    let (initial, labels) = starting_partition(None, n)?;
    let mut agg = Agglomeration::new(&adj, &initial, &labels);
    let mut progress = Progress::new(progress, "walktrap");

    let walk = Walk::new(&adj);
    let mut dist: Vec<Array1<f64>> = (0..n).map(|v| walk.distribution(v, steps)).collect();
    let mut size = vec![1.0; n];

    let mut cost: HashMap<(usize, usize), f64> = HashMap::new();
    for a in 0..n {
        for (b, _) in agg.links(a) {
            if a < b {
                cost.insert((a, b), walk.sigma(&dist, &size, a, b));
            }
        }
    }

    let total = n.saturating_sub(1);
    while let Some((a, b)) = cheapest(&cost) {
        let c = agg.merge(a, b);
        cost.retain(|&(x, y), _| x != a && x != b && y != a && y != b);

        let (sa, sb) = (size[a], size[b]);
        let pa = std::mem::replace(&mut dist[a], Array1::zeros(0));
        let pb = std::mem::replace(&mut dist[b], Array1::zeros(0));
        dist.push((pa * sa + pb * sb) / (sa + sb));
        size.push(sa + sb);

        let neighbors: Vec<usize> = agg.links(c).map(|(other, _)| other).collect();
        for other in neighbors {
            cost.insert((other, c), walk.sigma(&dist, &size, other, c));
        }
        progress.update(agg.merge_count(), total);
    }
    progress.finish();

    let (dendrogram, modularity) = agg.into_dendrogram()?;
    Ok(WalktrapResult {
        dendrogram,
        modularity,
    })
}

/// Adjacent pair with the smallest merge cost, lowest ids on ties.
fn cheapest(cost: &HashMap<(usize, usize), f64>) -> Option<(usize, usize)> {
    cost.iter()
        .min_by(|x, y| x.1.total_cmp(y.1).then(x.0.cmp(y.0)))
        .map(|(&pair, _)| pair)
}

struct Walk<'a> {
    adj: &'a Adjacency,
    inv_degree: Array1<f64>,
}

impl<'a> Walk<'a> {
    fn new(adj: &'a Adjacency) -> Self {
        let inv_degree = adj.degree.iter().map(|d| 1.0 / (d + 1.0)).collect();
        Walk { adj, inv_degree }
    }

    /// Distribution of a `steps`-step walk started at `v`.
    fn distribution(&self, v: usize, steps: usize) -> Array1<f64> {
        let n = self.adj.len();
        let mut current = Array1::zeros(n);
        current[v] = 1.0;
        for _ in 0..steps {
            let mut next = Array1::zeros(n);
            for (k, &p) in current.iter().enumerate() {
                if p == 0.0 {
                    continue;
                }
                let share = p * self.inv_degree[k];
                next[k] += share;
                for &j in &self.adj.neighbors[k] {
                    next[j] += share;
                }
            }
            current = next;
        }
        current
    }

    /// Increase in total walk distance caused by merging `a` and `b`.
    fn sigma(&self, dist: &[Array1<f64>], size: &[f64], a: usize, b: usize) -> f64 {
        let diff = &dist[a] - &dist[b];
        let d2: f64 = (&diff * &diff * &self.inv_degree).sum();
        let (sa, sb) = (size[a], size[b]);
        d2 * sa * sb / (sa + sb) / self.adj.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modularity::{modularity, which_max};
    use crate::progress::NoProgress;
    use crate::test_graphs;

    #[test]
    fn test_distribution_sums_to_one() {
        let g = test_graphs::karate();
        let adj = Adjacency::new(&g);
        let walk = Walk::new(&adj);
        let p = walk.distribution(5, 4);
        assert!((p.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_two_triangles() {
        let g = test_graphs::two_triangles();
        let r = walktrap(&g, 4, &mut NoProgress).unwrap();
        assert_eq!(r.dendrogram.len(), 5);
        let best = which_max(&r.modularity).unwrap();
        assert_eq!(best, 4);
        assert_eq!(r.dendrogram.cut(best).unwrap(), vec![0, 0, 0, 1, 1, 1]);
        assert!((r.modularity[best] - 5.0 / 14.0).abs() < 1e-12);
    }

    #[test]
    fn test_karate_trace_matches_cut() {
        let g = test_graphs::karate();
        let r = walktrap(&g, 4, &mut NoProgress).unwrap();
        assert_eq!(r.modularity.len(), 34);
        let best = which_max(&r.modularity).unwrap();
        let membership = r.dendrogram.cut(best).unwrap();
        let q = modularity(&g, &membership).unwrap();
        assert!((q - r.modularity[best]).abs() < 1e-9);
        assert!(q > 0.3, "q = {q}");
    }

    #[test]
    fn test_disconnected_graph() {
        let g = test_graphs::cliques(2, 3);
        let r = walktrap(&g, 4, &mut NoProgress).unwrap();
        assert_eq!(r.dendrogram.len(), 4);
        let best = which_max(&r.modularity).unwrap();
        assert_eq!(r.dendrogram.cut(best).unwrap(), vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_empty_graph() {
        let g = test_graphs::path(0);
        let r = walktrap(&g, 4, &mut NoProgress).unwrap();
        assert!(r.dendrogram.is_empty());
        assert_eq!(r.modularity, vec![0.0]);
    }
}
