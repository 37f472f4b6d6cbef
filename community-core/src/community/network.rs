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

use foldhash::{HashMap, HashMapExt};

use crate::common::{community_count, relabel};
use crate::graph::{edge_pairs, Graph};

/// Weighted graph whose nodes are groups of original vertices.
///
/// Built from the input graph with unit weights and then repeatedly
/// aggregated by the multi-level algorithms. Internal edges of a group
/// become a self-loop entry `adj[u][u]` holding twice their weight, so a
/// node's degree is always the sum of its adjacency row.
#[derive(Clone, Debug)]
pub(super) struct Network {
    pub adj: Vec<HashMap<usize, f64>>,
    pub degree: Vec<f64>,
    /// Sum of all degrees (`2m`).
    pub total_weight: f64,
    /// Original vertices represented by each node.
    pub members: Vec<Vec<usize>>,
}

impl Network {
    pub fn from_graph(graph: &Graph) -> Self {
        let n = graph.node_count();
        let mut adj: Vec<HashMap<usize, f64>> = vec![HashMap::new(); n];
        for (u, v) in edge_pairs(graph) {
            *adj[u].entry(v).or_insert(0.0) += 1.0;
            *adj[v].entry(u).or_insert(0.0) += 1.0;
        }
        Self::with_members(adj, (0..n).map(|v| vec![v]).collect())
    }

    fn with_members(adj: Vec<HashMap<usize, f64>>, members: Vec<Vec<usize>>) -> Self {
        let degree: Vec<f64> = adj.iter().map(|row| row.values().sum()).collect();
        let total_weight = degree.iter().sum();
        Network {
            adj,
            degree,
            total_weight,
            members,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.adj.len()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.members.iter().map(Vec::len).sum()
    }

    /// Weight from `node` to each community around it, self-loop excluded.
    pub fn neighbor_weights(&self, node: usize, node_to_comm: &[usize]) -> HashMap<usize, f64> {
        let mut weights = HashMap::new();
        for (&neighbor, &weight) in &self.adj[node] {
            if neighbor != node {
                *weights.entry(node_to_comm[neighbor]).or_insert(0.0) += weight;
            }
        }
        weights
    }

    /// Collapse every community of `node_to_comm` into one node.
    ///
    /// New node ids follow the first appearance of each community. Returns
    /// the new network and the new node of every old node.
    pub fn aggregate(&self, node_to_comm: &[usize]) -> (Self, Vec<usize>) {
        let new_id = relabel(node_to_comm);
        let k = community_count(&new_id);
        let mut adj: Vec<HashMap<usize, f64>> = vec![HashMap::new(); k];
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
        for node in 0..self.len() {
            let c = new_id[node];
            members[c].extend_from_slice(&self.members[node]);
            for (&neighbor, &weight) in &self.adj[node] {
                *adj[c].entry(new_id[neighbor]).or_insert(0.0) += weight;
            }
        }
        (Self::with_members(adj, members), new_id)
    }

    /// Modularity of a node partition with resolution `gamma`.
    pub fn modularity(&self, node_to_comm: &[usize], gamma: f64) -> f64 {
        if self.total_weight == 0.0 {
            return 0.0;
        }
        let labels = relabel(node_to_comm);
        let k = community_count(&labels);
        let mut inside = vec![0.0; k];
        let mut total = vec![0.0; k];
        for node in 0..self.len() {
            let c = labels[node];
            total[c] += self.degree[node];
            for (&neighbor, &weight) in &self.adj[node] {
                if labels[neighbor] == c {
                    inside[c] += weight;
                }
            }
        }
        let m2 = self.total_weight;
        inside
            .iter()
            .zip(&total)
            .map(|(w, t)| w / m2 - gamma * (t / m2).powi(2))
            .sum()
    }

    /// Canonical membership of the original vertices.
    pub fn project(&self, node_to_comm: &[usize]) -> Vec<usize> {
        let mut membership = vec![0; self.vertex_count()];
        for (node, vertices) in self.members.iter().enumerate() {
            for &v in vertices {
                membership[v] = node_to_comm[node];
            }
        }
        relabel(&membership)
    }
}
