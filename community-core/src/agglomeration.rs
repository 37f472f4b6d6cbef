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

//! Bookkeeping for bottom-up merging of communities.
//!
//! Tracks modularity incrementally while clusters are merged pairwise and
//! records the merge matrix. Cluster ids follow the [`Dendrogram`]
//! convention: the starting communities are `0..k` and the `i`-th merge
//! creates cluster `k + i`.

use foldhash::{HashMap, HashMapExt};

use crate::common::{flatten, relabel};
use crate::community::HierarchicalResult;
use crate::dendrogram::Dendrogram;
use crate::error::Result;
use crate::graph::Adjacency;
use crate::modularity::which_max;
use crate::seed::{self, SeedConstraint};

/// Starting communities for an agglomerative run: seed groups first, then
/// singletons, or all singletons without a seed.
pub(crate) fn starting_partition(
    seed: Option<&SeedConstraint>,
    vertex_count: usize,
) -> Result<(Vec<usize>, Vec<Option<usize>>)> {
    match seed {
        Some(seed) => {
            seed.check_len(vertex_count)?;
            Ok(seed.initial_partition())
        }
        None => Ok(((0..vertex_count).collect(), vec![None; vertex_count])),
    }
}

pub(crate) struct Agglomeration {
    leaves: usize,
    two_m: f64,
    degree: Vec<f64>,
    /// Number of edges between two live clusters, stored in both directions.
    links: Vec<HashMap<usize, f64>>,
    seed: Vec<Option<usize>>,
    parent: Vec<usize>,
    alive: Vec<bool>,
    q: f64,
    merges: Vec<[usize; 2]>,
    trace: Vec<f64>,
}

impl Agglomeration {
    /// Start from `initial`, a membership into `labels.len()` communities,
    /// where `labels[c]` is the seed id carried by community `c`.
    pub fn new(adj: &Adjacency, initial: &[usize], labels: &[Option<usize>]) -> Self {
        let k = labels.len();
        let two_m = adj.two_m();
        let mut degree = vec![0.0; k];
        let mut internal = vec![0.0; k];
        let mut links: Vec<HashMap<usize, f64>> = (0..k).map(|_| HashMap::new()).collect();
        for (u, nbrs) in adj.neighbors.iter().enumerate() {
            let cu = initial[u];
            degree[cu] += nbrs.len() as f64;
            for &v in nbrs {
                let cv = initial[v];
                if cu == cv {
                    internal[cu] += 0.5;
                } else {
                    *links[cu].entry(cv).or_insert(0.0) += 1.0;
                }
            }
        }

        let q = if two_m > 0.0 {
            internal
                .iter()
                .zip(&degree)
                .map(|(l, d)| 2.0 * l / two_m - (d / two_m).powi(2))
                .sum()
        } else {
            0.0
        };

        Agglomeration {
            leaves: k,
            two_m,
            degree,
            links,
            seed: labels.to_vec(),
            parent: (0..k).collect(),
            alive: vec![true; k],
            q,
            merges: Vec::new(),
            trace: vec![q],
        }
    }

    /// Every vertex in its own community, with no seed labels.
    #[cfg(test)]
    pub fn singletons(adj: &Adjacency) -> Self {
        let n = adj.len();
        let initial: Vec<usize> = (0..n).collect();
        Self::new(adj, &initial, &vec![None; n])
    }

    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.leaves
    }

    #[inline]
    pub fn modularity(&self) -> f64 {
        self.q
    }

    #[inline]
    pub fn merge_count(&self) -> usize {
        self.merges.len()
    }

    #[inline]
    pub fn is_alive(&self, c: usize) -> bool {
        self.alive.get(c).copied().unwrap_or(false)
    }

    /// Live cluster ids in increasing order.
    pub fn active(&self) -> impl Iterator<Item = usize> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter_map(|(c, &alive)| alive.then_some(c))
    }

    /// Clusters sharing at least one edge with `c`, with the edge count.
    pub fn links(&self, c: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.links[c].iter().map(|(&other, &e)| (other, e))
    }

    /// Modularity change of merging live clusters `a` and `b`.
    #[inline]
    pub fn delta(&self, a: usize, b: usize) -> f64 {
        if self.two_m == 0.0 {
            return 0.0;
        }
        let e = self.links[a].get(&b).copied().unwrap_or(0.0);
        2.0 * e / self.two_m - 2.0 * self.degree[a] * self.degree[b] / (self.two_m * self.two_m)
    }

    /// False when either cluster is gone or their seed labels conflict.
    #[inline]
    pub fn can_merge(&self, a: usize, b: usize) -> bool {
        a != b && self.is_alive(a) && self.is_alive(b) && seed::compatible(self.seed[a], self.seed[b])
    }

    /// Current cluster of a starting community.
    pub fn find(&mut self, leaf: usize) -> usize {
        let mut root = leaf;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = leaf;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Merge two live clusters and return the id of the new one.
    pub fn merge(&mut self, a: usize, b: usize) -> usize {
        debug_assert!(self.can_merge(a, b));
        let created = self.leaves + self.merges.len();
        self.q += self.delta(a, b);

        let mut joined = std::mem::take(&mut self.links[a]);
        for (other, e) in std::mem::take(&mut self.links[b]) {
            *joined.entry(other).or_insert(0.0) += e;
        }
        joined.remove(&a);
        joined.remove(&b);
        for (&other, &e) in &joined {
            let back = &mut self.links[other];
            back.remove(&a);
            back.remove(&b);
            back.insert(created, e);
        }

        self.links.push(joined);
        self.degree.push(self.degree[a] + self.degree[b]);
        self.seed.push(seed::join(self.seed[a], self.seed[b]));
        self.parent.push(created);
        self.parent[a] = created;
        self.parent[b] = created;
        self.alive[a] = false;
        self.alive[b] = false;
        self.alive.push(true);
        self.merges.push([a, b]);
        self.trace.push(self.q);
        created
    }

    /// Best merge of the remaining connected pairs: largest modularity
    /// gain, lowest pair of ids on ties.
    pub fn best_connected_pair(&self) -> Option<(usize, usize)> {
        let mut best: Option<(f64, usize, usize)> = None;
        for a in self.active() {
            for (b, _) in self.links(a) {
                if b <= a || !self.can_merge(a, b) {
                    continue;
                }
                let dq = self.delta(a, b);
                let better = match best {
                    None => true,
                    Some((bq, ba, bb)) => dq > bq || (dq == bq && (a, b) < (ba, bb)),
                };
                if better {
                    best = Some((dq, a, b));
                }
            }
        }
        best.map(|(_, a, b)| (a, b))
    }

    /// The merge matrix and the modularity before and after every merge.
    pub fn into_dendrogram(self) -> Result<(Dendrogram, Vec<f64>)> {
        Ok((Dendrogram::new(self.leaves, self.merges)?, self.trace))
    }

    /// Cut at the highest modularity seen and project onto vertices.
    pub fn into_result(self, initial: Vec<usize>) -> Result<HierarchicalResult> {
        let (dendrogram, modularity) = self.into_dendrogram()?;
        let best = which_max(&modularity).unwrap_or(0);
        let membership = relabel(&flatten(&initial, &dendrogram.cut(best)?));
        Ok(HierarchicalResult {
            dendrogram,
            initial,
            modularity,
            membership,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Adjacency;
    use crate::modularity::modularity;
    use crate::test_graphs;

    #[test]
    fn initial_modularity_matches_evaluator() {
        let g = test_graphs::karate();
        let adj = Adjacency::new(&g);
        let agg = Agglomeration::singletons(&adj);
        let expected = modularity(&g, &(0..34).collect::<Vec<_>>()).unwrap();
        assert!((agg.modularity() - expected).abs() < 1e-12);
    }

    #[test]
    fn merges_track_modularity() {
        let g = test_graphs::two_triangles();
        let adj = Adjacency::new(&g);
        let mut agg = Agglomeration::singletons(&adj);
        let c = agg.merge(0, 1);
        assert_eq!(c, 6);
        let d = agg.merge(c, 2);
        let e = agg.merge(3, 4);
        agg.merge(e, 5);
        assert!((agg.modularity() - 5.0 / 14.0).abs() < 1e-12);
        assert_eq!(agg.find(1), d);
        assert_eq!(agg.active().collect::<Vec<_>>(), vec![d, 9]);
        assert_eq!(agg.links(d).collect::<Vec<_>>(), vec![(9, 1.0)]);
    }

    #[test]
    fn conflicting_seeds_cannot_merge() {
        let g = test_graphs::path(3);
        let adj = Adjacency::new(&g);
        let agg = Agglomeration::new(&adj, &[0, 1, 2], &[Some(0), None, Some(1)]);
        assert!(agg.can_merge(0, 1));
        assert!(!agg.can_merge(0, 2));
    }

    #[test]
    fn best_pair_breaks_ties_by_lowest_ids() {
        let g = test_graphs::path(3);
        let adj = Adjacency::new(&g);
        let agg = Agglomeration::singletons(&adj);
        assert_eq!(agg.best_connected_pair(), Some((0, 1)));
    }
}
