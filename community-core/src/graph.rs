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

//! Graph construction and the adjacency views shared by the algorithms.

use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use crate::error::{Error, Result};

/// Unweighted undirected graph consumed by every algorithm in this crate.
pub type Graph = UnGraph<(), ()>;

/// Build a graph with `vertex_count` vertices from a flattened edge array.
///
/// `edges` holds `2 * edge_count` reals: `[u0, v0, u1, v1, ...]`. Every
/// endpoint must be an integer in `[0, vertex_count)`. Self-loops and
/// parallel edges are accepted as given.
pub fn create(vertex_count: i64, edges: &[f64]) -> Result<Graph> {
    let n = usize::try_from(vertex_count).map_err(|_| Error::InvalidVertexCount(vertex_count))?;
    if edges.len() % 2 != 0 {
        return Err(Error::OddEdgeArray(edges.len()));
    }

    let mut graph = Graph::with_capacity(n, edges.len() / 2);
    for _ in 0..n {
        graph.add_node(());
    }
    for pair in edges.chunks_exact(2) {
        let u = vertex_id(pair[0], n)?;
        let v = vertex_id(pair[1], n)?;
        graph.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
    }
    Ok(graph)
}

/// Build a graph from integer endpoint pairs.
pub fn from_pairs(vertex_count: usize, pairs: &[(usize, usize)]) -> Result<Graph> {
    let mut graph = Graph::with_capacity(vertex_count, pairs.len());
    for _ in 0..vertex_count {
        graph.add_node(());
    }
    for &(u, v) in pairs {
        for end in [u, v] {
            if end >= vertex_count {
                return Err(Error::InvalidVertexId {
                    value: end as f64,
                    vertex_count,
                });
            }
        }
        graph.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
    }
    Ok(graph)
}

#[inline]
fn vertex_id(value: f64, vertex_count: usize) -> Result<usize> {
    if value.is_finite() && value.fract() == 0.0 && value >= 0.0 && value < vertex_count as f64 {
        Ok(value as usize)
    } else {
        Err(Error::InvalidVertexId {
            value,
            vertex_count,
        })
    }
}

/// Edge list as `(source, target)` index pairs in insertion order.
pub(crate) fn edge_pairs(graph: &Graph) -> Vec<(usize, usize)> {
    graph
        .edge_references()
        .map(|e| (e.source().index(), e.target().index()))
        .collect()
}

/// Neighbor lists with one entry per edge end.
///
/// A self-loop on `u` appears twice in `neighbors[u]`, so `degree[u]` is
/// always `neighbors[u].len()` and a loop adds two to the degree.
#[derive(Clone, Debug)]
pub(crate) struct Adjacency {
    pub neighbors: Vec<Vec<usize>>,
    pub degree: Vec<f64>,
    pub edge_count: usize,
}

impl Adjacency {
    pub fn new(graph: &Graph) -> Self {
        let n = graph.node_count();
        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (u, v) in edge_pairs(graph) {
            neighbors[u].push(v);
            neighbors[v].push(u);
        }
        let degree = neighbors.iter().map(|nbrs| nbrs.len() as f64).collect();
        Adjacency {
            neighbors,
            degree,
            edge_count: graph.edge_count(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// Twice the number of edges (sum of all degrees).
    #[inline]
    pub fn two_m(&self) -> f64 {
        2.0 * self.edge_count as f64
    }

    /// Connected component id per vertex, numbered by lowest member.
    pub fn components(&self) -> Vec<usize> {
        let n = self.len();
        let mut component = vec![usize::MAX; n];
        let mut seen = FixedBitSet::with_capacity(n);
        let mut queue = VecDeque::new();
        let mut next = 0;
        for start in 0..n {
            if seen.put(start) {
                continue;
            }
            component[start] = next;
            queue.push_back(start);
            while let Some(u) = queue.pop_front() {
                for &v in &self.neighbors[u] {
                    if !seen.put(v) {
                        component[v] = next;
                        queue.push_back(v);
                    }
                }
            }
            next += 1;
        }
        component
    }
}

/// True when the graph has at most one connected component.
pub fn is_connected(graph: &Graph) -> bool {
    Adjacency::new(graph).components().iter().all(|&c| c == 0)
}
