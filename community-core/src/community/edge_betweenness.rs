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

use std::collections::VecDeque;

use fixedbitset::FixedBitSet;

use super::HierarchicalResult;
use crate::agglomeration::{starting_partition, Agglomeration};
use crate::error::Result;
use crate::graph::{edge_pairs, Adjacency, Graph};
use crate::progress::{Progress, ProgressHandler};
use crate::seed::SeedConstraint;

/// Divisive clustering by repeated removal of the edge with the highest
/// betweenness (Girvan and Newman).
///
/// Betweenness is recomputed after every removal, but only inside the
/// component that contained the removed edge. Ties go to the lowest edge
/// index. The removal sequence read backwards is replayed as merges, which
/// yields the dendrogram and the modularity of every level.
///
/// With a seed, replay starts from the seed groups and skips any merge that
/// would join two different seed ids.
pub fn edge_betweenness(
    graph: &Graph,
    seed: Option<&SeedConstraint>,
    progress: &mut dyn ProgressHandler,
) -> Result<HierarchicalResult> {
    let adj = Adjacency::new(graph);
    let (initial, labels) = starting_partition(seed, adj.len())?;
    let edges = edge_pairs(graph);
    let removed = removal_order(adj.len(), &edges, &mut Progress::new(progress, "edge betweenness"));

    let mut agg = Agglomeration::new(&adj, &initial, &labels);
    for &e in removed.iter().rev() {
        let (u, v) = edges[e];
        let a = agg.find(initial[u]);
        let b = agg.find(initial[v]);
        if agg.can_merge(a, b) {
            agg.merge(a, b);
        }
    }
    agg.into_result(initial)
}

fn removal_order(n: usize, edges: &[(usize, usize)], progress: &mut Progress) -> Vec<usize> {
    let m = edges.len();
    let mut incident: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    for (e, &(u, v)) in edges.iter().enumerate() {
        // loops never lie on a shortest path
        if u != v {
            incident[u].push((v, e));
            incident[v].push((u, e));
        }
    }

    let mut alive = FixedBitSet::with_capacity(m);
    alive.insert_range(..);
    let mut scores = vec![0.0; m];
    let mut brandes = Brandes::new(n);
    let everyone: Vec<usize> = (0..n).collect();
    brandes.accumulate(&everyone, &incident, &alive, &mut scores);

    let mut order = Vec::with_capacity(m);
    while let Some(e) = highest(&alive, &scores) {
        alive.set(e, false);
        order.push(e);
        progress.update(order.len(), m);

        let (u, v) = edges[e];
        if u == v {
            continue;
        }
        let mut touched = brandes.component(u, &incident, &alive);
        if !touched.contains(&v) {
            touched.extend(brandes.component(v, &incident, &alive));
        }
        for &x in &touched {
            for &(_, f) in &incident[x] {
                scores[f] = 0.0;
            }
        }
        brandes.accumulate(&touched, &incident, &alive, &mut scores);
    }
    progress.finish();
    order
}

fn highest(alive: &FixedBitSet, scores: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for e in alive.ones() {
        if best.map_or(true, |b| scores[e] > scores[b]) {
            best = Some(e);
        }
    }
    best
}

/// Scratch buffers for Brandes' shortest-path counting.
struct Brandes {
    dist: Vec<usize>,
    sigma: Vec<f64>,
    delta: Vec<f64>,
    preds: Vec<Vec<(usize, usize)>>,
    stack: Vec<usize>,
    queue: VecDeque<usize>,
    seen: FixedBitSet,
}

impl Brandes {
    fn new(n: usize) -> Self {
        Brandes {
            dist: vec![usize::MAX; n],
            sigma: vec![0.0; n],
            delta: vec![0.0; n],
            preds: vec![Vec::new(); n],
            stack: Vec::with_capacity(n),
            queue: VecDeque::with_capacity(n),
            seen: FixedBitSet::with_capacity(n),
        }
    }

    /// Vertices reachable from `start` over live edges.
    fn component(
        &mut self,
        start: usize,
        incident: &[Vec<(usize, usize)>],
        alive: &FixedBitSet,
    ) -> Vec<usize> {
        self.seen.clear();
        self.seen.insert(start);
        let mut found = vec![start];
        self.queue.push_back(start);
        while let Some(u) = self.queue.pop_front() {
            for &(v, e) in &incident[u] {
                if alive.contains(e) && !self.seen.put(v) {
                    found.push(v);
                    self.queue.push_back(v);
                }
            }
        }
        found
    }

    /// Add the edge betweenness contributed by every source in `sources`.
    fn accumulate(
        &mut self,
        sources: &[usize],
        incident: &[Vec<(usize, usize)>],
        alive: &FixedBitSet,
        scores: &mut [f64],
    ) {
        for &s in sources {
            self.dist[s] = 0;
            self.sigma[s] = 1.0;
            self.queue.push_back(s);
            while let Some(u) = self.queue.pop_front() {
                self.stack.push(u);
                for &(v, e) in &incident[u] {
                    if !alive.contains(e) {
                        continue;
                    }
                    if self.dist[v] == usize::MAX {
                        self.dist[v] = self.dist[u] + 1;
                        self.queue.push_back(v);
                    }
                    if self.dist[v] == self.dist[u] + 1 {
                        self.sigma[v] += self.sigma[u];
                        self.preds[v].push((u, e));
                    }
                }
            }

            while let Some(w) = self.stack.pop() {
                for i in 0..self.preds[w].len() {
                    let (p, e) = self.preds[w][i];
                    let c = self.sigma[p] / self.sigma[w] * (1.0 + self.delta[w]);
                    scores[e] += c;
                    self.delta[p] += c;
                }
                self.dist[w] = usize::MAX;
                self.sigma[w] = 0.0;
                self.delta[w] = 0.0;
                self.preds[w].clear();
            }
        }
    }
}
