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
// https://arxiv.org/abs/1810.08473

use foldhash::{HashMap, HashMapExt};

use super::network::Network;
use crate::common::{build_rng, community_count, group_by_labels, relabel, shuffle_nodes, CommunityRng};
use crate::error::Result;
use crate::graph::Graph;
use crate::progress::{Progress, ProgressHandler};

/// Gains at or below this are treated as zero.
const EPSILON: f64 = 1e-9;
const MAX_LOCAL_PASSES: usize = 10;

/// Leiden modularity optimization (Traag, Waltman and van Eck).
///
/// Each level runs local moves, then refines every community by merging
/// singleton nodes into well-connected sub-communities of the same
/// community, and aggregates the refined partition. The aggregate starts
/// from the unrefined communities. Stops when local moves leave every node
/// alone or after `max_levels` levels.
pub fn leiden(
    graph: &Graph,
    resolution: f64,
    max_levels: usize,
    rng_seed: u64,
    progress: &mut dyn ProgressHandler,
) -> Result<Vec<usize>> {
    let n = graph.node_count();
    let mut rng = build_rng(rng_seed);
    let mut progress = Progress::new(progress, "leiden");

    let mut graph_state = Network::from_graph(graph);
    let mut node_to_comm: Vec<usize> = (0..n).collect();

    for level in 0..max_levels {
        move_nodes(&graph_state, &mut node_to_comm, resolution, &mut rng);
        node_to_comm = relabel(&node_to_comm);
        progress.update(level + 1, max_levels);
        if community_count(&node_to_comm) == graph_state.len() {
            break;
        }

        let refined = refine(&graph_state, &node_to_comm, resolution, &mut rng);
        let (next, new_id) = graph_state.aggregate(&refined);
        let mut next_comm = vec![0; next.len()];
        for (node, &c) in new_id.iter().enumerate() {
            next_comm[c] = node_to_comm[node];
        }
        graph_state = next;
        node_to_comm = relabel(&next_comm);
    }
    progress.finish();
    Ok(graph_state.project(&node_to_comm))
}

/// Local moving phase: best strictly positive move per node, repeated.
fn move_nodes(
    graph: &Network,
    node_to_comm: &mut [usize],
    resolution: f64,
    rng: &mut CommunityRng,
) {
    let m2 = graph.total_weight;
    if m2 == 0.0 {
        return;
    }
    let mut comm_degrees = vec![0.0; graph.len()];
    for (node, &comm) in node_to_comm.iter().enumerate() {
        comm_degrees[comm] += graph.degree[node];
    }

    let mut nodes: Vec<usize> = (0..graph.len()).collect();
    for _ in 0..MAX_LOCAL_PASSES {
        let mut improved = false;
        shuffle_nodes(rng, &mut nodes);
        for &node in &nodes {
            let current = node_to_comm[node];
            let k = graph.degree[node];
            comm_degrees[current] -= k;

            let weights = graph.neighbor_weights(node, node_to_comm);
            let k_in_current = weights.get(&current).copied().unwrap_or(0.0);
            let (best, gain) = best_move(
                current,
                k_in_current,
                weights.iter().map(|(&c, &w)| (c, w, comm_degrees[c])),
                comm_degrees[current],
                k,
                m2,
                resolution,
            );

            if gain > EPSILON {
                node_to_comm[node] = best;
                comm_degrees[best] += k;
                improved = true;
            } else {
                comm_degrees[current] += k;
            }
        }
        if !improved {
            break;
        }
    }
}

/// Best target among `candidates` as `(community, gain)`, relative to
/// staying in `current`. Lowest community id wins ties.
fn best_move(
    current: usize,
    k_in_current: f64,
    candidates: impl Iterator<Item = (usize, f64, f64)>,
    sigma_current: f64,
    k: f64,
    m2: f64,
    resolution: f64,
) -> (usize, f64) {
    let mut best = (current, 0.0);
    for (target, k_in_target, sigma_target) in candidates {
        if target == current {
            continue;
        }
        let gain = 2.0 * (k_in_target - k_in_current) / m2
            - 2.0 * resolution * k * (sigma_target - sigma_current) / (m2 * m2);
        if gain > best.1 || (gain == best.1 && gain > 0.0 && target < best.0) {
            best = (target, gain);
        }
    }
    best
}

/// Refinement phase. Returns a partition that subdivides `node_to_comm`.
fn refine(
    graph: &Network,
    node_to_comm: &[usize],
    resolution: f64,
    rng: &mut CommunityRng,
) -> Vec<usize> {
    let m2 = graph.total_weight;
    let mut refined: Vec<usize> = (0..graph.len()).collect();
    let mut sub_degrees = graph.degree.clone();

    for mut nodes_in_comm in group_by_labels(node_to_comm) {
        if nodes_in_comm.len() <= 1 {
            continue;
        }
        let comm = node_to_comm[nodes_in_comm[0]];
        let comm_degree: f64 = nodes_in_comm.iter().map(|&v| graph.degree[v]).sum();

        // weight from each node to the rest of its community
        let mut inner: HashMap<usize, f64> = HashMap::with_capacity(nodes_in_comm.len());
        for &node in &nodes_in_comm {
            let w: f64 = graph.adj[node]
                .iter()
                .filter(|(&nb, _)| nb != node && node_to_comm[nb] == comm)
                .map(|(_, &w)| w)
                .sum();
            inner.insert(node, w);
        }
        // weight from each sub-community to the rest of the community
        let mut sub_external = inner.clone();
        let mut singleton: HashMap<usize, bool> = nodes_in_comm.iter().map(|&v| (v, true)).collect();

        shuffle_nodes(rng, &mut nodes_in_comm);
        for &node in &nodes_in_comm {
            if !singleton.get(&node).copied().unwrap_or(false) {
                continue;
            }
            let k = graph.degree[node];
            // node must be well connected to its community
            if inner[&node] < resolution * k * (comm_degree - k) / m2 {
                continue;
            }

            let mut weights: HashMap<usize, f64> = HashMap::new();
            for (&nb, &w) in &graph.adj[node] {
                if nb != node && node_to_comm[nb] == comm {
                    *weights.entry(refined[nb]).or_insert(0.0) += w;
                }
            }
            let current = refined[node];
            let candidates = weights.iter().filter_map(|(&sub, &w)| {
                let sigma = sub_degrees[sub];
                let external = sub_external.get(&sub).copied().unwrap_or(0.0);
                // target must be well connected too
                (external >= resolution * sigma * (comm_degree - sigma) / m2).then_some((sub, w, sigma))
            });
            let (best, gain) = best_move(current, 0.0, candidates, 0.0, k, m2, resolution);
            if best == current || gain < 0.0 {
                continue;
            }

            let w_to_best = weights.get(&best).copied().unwrap_or(0.0);
            refined[node] = best;
            sub_degrees[best] += k;
            sub_degrees[current] = 0.0;
            let joined = sub_external.get(&best).copied().unwrap_or(0.0) + inner[&node] - 2.0 * w_to_best;
            sub_external.insert(best, joined);
            sub_external.remove(&current);
            for &member in &nodes_in_comm {
                if refined[member] == best {
                    singleton.insert(member, false);
                }
            }
        }
    }
    refined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modularity::modularity;
    use crate::progress::NoProgress;
    use crate::test_graphs;

    #[test]
    fn test_two_triangles() {
        let g = test_graphs::two_triangles();
        let membership = leiden(&g, 1.0, 10, 7, &mut NoProgress).unwrap();
        assert_eq!(membership, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_karate_quality() {
        let g = test_graphs::karate();
        let membership = leiden(&g, 1.0, 10, 42, &mut NoProgress).unwrap();
        assert_eq!(membership.len(), 34);
        let q = modularity(&g, &membership).unwrap();
        assert!(q > 0.35, "q = {q}");
    }

    #[test]
    fn test_communities_are_connected() {
        let g = test_graphs::ring_of_cliques(6, 5);
        let membership = leiden(&g, 1.0, 10, 3, &mut NoProgress).unwrap();
        for group in group_by_labels(&membership) {
            // every clique of five stays whole
            assert_eq!(group.len() % 5, 0);
        }
    }

    #[test]
    fn test_empty_and_edgeless() {
        let g = test_graphs::path(0);
        assert!(leiden(&g, 1.0, 10, 1, &mut NoProgress).unwrap().is_empty());
        let g = crate::graph::from_pairs(3, &[]).unwrap();
        assert_eq!(leiden(&g, 1.0, 10, 1, &mut NoProgress).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_refined_partition_subdivides() {
        let g = test_graphs::karate();
        let net = Network::from_graph(&g);
        let coarse: Vec<usize> = (0..34).map(|v| usize::from(v >= 17)).collect();
        let mut rng = build_rng(5);
        let refined = refine(&net, &coarse, 1.0, &mut rng);
        for u in 0..34 {
            for v in 0..34 {
                if refined[u] == refined[v] {
                    assert_eq!(coarse[u], coarse[v]);
                }
            }
        }
    }
}
