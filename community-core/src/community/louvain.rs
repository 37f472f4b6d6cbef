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
// https://arxiv.org/abs/0803.0476

use super::network::Network;
use crate::common::{build_rng, shuffle_nodes, CommunityRng};
use crate::error::Result;
use crate::graph::Graph;
use crate::modularity::which_max;
use crate::progress::{Progress, ProgressHandler};
use crate::seed::SeedConstraint;

/// Maximum passes over the nodes within one level.
const MAX_PASSES: usize = 10;

/// Partitions found at each level of a Louvain run.
#[derive(Clone, Debug, PartialEq)]
pub struct LouvainResult {
    /// Membership of the original vertices after each level.
    pub levels: Vec<Vec<usize>>,
    /// Modularity of each level.
    pub modularity: Vec<f64>,
    /// The level with the highest modularity (first on ties).
    pub membership: Vec<usize>,
}

/// Multi-level modularity optimization (Blondel et al.).
///
/// Each level moves nodes, in random order, to the neighboring community
/// with the best strictly positive gain, then collapses communities into
/// nodes. The run stops when a level changes nothing or improves modularity
/// by no more than `threshold`.
///
/// With a seed, vertices sharing a seed id start in one community and every
/// seeded vertex is pinned: free vertices may join a seeded community but
/// seeded ones never move, so different seed ids never share a community.
/// If no level improves on the start, the single reported level is the
/// starting partition itself.
pub fn louvain(
    graph: &Graph,
    seed: Option<&SeedConstraint>,
    resolution: f64,
    threshold: f64,
    rng_seed: u64,
    progress: &mut dyn ProgressHandler,
) -> Result<LouvainResult> {
    let n = graph.node_count();
    let mut rng = build_rng(rng_seed);
    let mut progress = Progress::new(progress, "louvain");

    let mut graph_state = Network::from_graph(graph);
    let (mut node_to_comm, mut pinned) = match seed {
        Some(seed) => {
            seed.check_len(n)?;
            let (initial, _) = seed.initial_partition();
            let pinned = seed.as_slice().iter().map(Option::is_some).collect();
            (initial, pinned)
        }
        None => ((0..n).collect(), vec![false; n]),
    };

    let mut levels = Vec::new();
    let mut trace = Vec::new();
    let mut current_modularity = graph_state.modularity(&node_to_comm, resolution);
    let start = (graph_state.project(&node_to_comm), current_modularity);

    loop {
        let improvement = run_one_level(&graph_state, &mut node_to_comm, &pinned, resolution, &mut rng);
        if !improvement {
            break;
        }

        let new_modularity = graph_state.modularity(&node_to_comm, resolution);
        levels.push(graph_state.project(&node_to_comm));
        trace.push(new_modularity);
        progress.update(n - graph_state.len(), n);

        if new_modularity - current_modularity <= threshold {
            break;
        }
        current_modularity = new_modularity;

        let (next, new_id) = graph_state.aggregate(&node_to_comm);
        let mut next_pinned = vec![false; next.len()];
        for (node, &c) in new_id.iter().enumerate() {
            next_pinned[c] |= pinned[node];
        }
        pinned = next_pinned;
        node_to_comm = (0..next.len()).collect();
        graph_state = next;
    }
    progress.finish();

    if levels.is_empty() {
        levels.push(start.0);
        trace.push(start.1);
    }
    let best = which_max(&trace).unwrap_or(0);
    let membership = levels[best].clone();
    Ok(LouvainResult {
        levels,
        modularity: trace,
        membership,
    })
}

/// One level of local moves. Returns true if any node changed community.
fn run_one_level(
    graph: &Network,
    node_to_comm: &mut [usize],
    pinned: &[bool],
    resolution: f64,
    rng: &mut CommunityRng,
) -> bool {
    let m2 = graph.total_weight;
    if m2 == 0.0 {
        return false;
    }
    let mut moved = false;

    let mut community_degrees = vec![0.0; graph.len()];
    for (node, &comm) in node_to_comm.iter().enumerate() {
        community_degrees[comm] += graph.degree[node];
    }

    let mut nodes: Vec<usize> = (0..graph.len()).filter(|&v| !pinned[v]).collect();
    shuffle_nodes(rng, &mut nodes);

    for _ in 0..MAX_PASSES {
        let mut nb_moves = 0;
        for &node in &nodes {
            let current_comm = node_to_comm[node];
            let node_degree = graph.degree[node];
            community_degrees[current_comm] -= node_degree;

            let neighbor_weights = graph.neighbor_weights(node, node_to_comm);
            let weight_to_current = neighbor_weights.get(&current_comm).copied().unwrap_or(0.0);
            let removal_cost = -(weight_to_current / m2)
                + resolution * community_degrees[current_comm] * node_degree / (m2 * m2);

            let mut best_comm = current_comm;
            let mut max_gain = 0.0;
            for (&candidate, &weight_to_comm) in &neighbor_weights {
                if candidate == current_comm {
                    continue;
                }
                let addition_gain = weight_to_comm / m2
                    - resolution * community_degrees[candidate] * node_degree / (m2 * m2);
                let gain = removal_cost + addition_gain;
                // strict improvement, lowest community id on ties
                if gain > max_gain || (gain == max_gain && gain > 0.0 && candidate < best_comm) {
                    max_gain = gain;
                    best_comm = candidate;
                }
            }

            community_degrees[best_comm] += node_degree;
            if best_comm != current_comm {
                node_to_comm[node] = best_comm;
                moved = true;
                nb_moves += 1;
            }
        }
        if nb_moves == 0 {
            break;
        }
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modularity::modularity;
    use crate::progress::NoProgress;
    use crate::test_graphs;

    fn run(graph: &Graph, seed: Option<&SeedConstraint>) -> LouvainResult {
        louvain(graph, seed, 1.0, 1e-7, 42, &mut NoProgress).unwrap()
    }

    #[test]
    fn test_two_triangles() {
        let g = test_graphs::two_triangles();
        let r = run(&g, None);
        assert_eq!(r.membership, vec![0, 0, 0, 1, 1, 1]);
        let best = r.modularity.iter().cloned().fold(f64::MIN, f64::max);
        assert!((best - 5.0 / 14.0).abs() < 1e-12);
    }

    #[test]
    fn test_karate_quality() {
        let g = test_graphs::karate();
        let r = run(&g, None);
        let best = r.modularity.iter().cloned().fold(f64::MIN, f64::max);
        assert!((0.35..=0.45).contains(&best), "best = {best}");
        let q = modularity(&g, &r.membership).unwrap();
        assert!((q - best).abs() < 1e-9);
        assert_eq!(r.levels.len(), r.modularity.len());
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let g = test_graphs::karate();
        assert_eq!(run(&g, None), run(&g, None));
    }

    #[test]
    fn test_levels_improve() {
        let g = test_graphs::ring_of_cliques(8, 4);
        let r = run(&g, None);
        for pair in r.modularity.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_edgeless_graph_reports_start() {
        let g = crate::graph::from_pairs(3, &[]).unwrap();
        let r = run(&g, None);
        assert_eq!(r.levels, vec![vec![0, 1, 2]]);
        assert_eq!(r.modularity, vec![0.0]);
    }

    #[test]
    fn test_seeded_vertices_are_pinned() {
        let g = test_graphs::karate();
        let mut seeds = vec![None; 34];
        seeds[0] = Some(1);
        seeds[4] = Some(1);
        seeds[31] = Some(0);
        seeds[33] = Some(0);
        let seed = SeedConstraint::new(seeds);
        let r = run(&g, Some(&seed));
        for level in &r.levels {
            assert_eq!(level[0], level[4]);
            assert_eq!(level[31], level[33]);
            assert_ne!(level[0], level[33]);
        }
    }

    #[test]
    fn test_conflicting_seeds_on_two_triangles() {
        let g = test_graphs::two_triangles();
        let seed = SeedConstraint::new(vec![Some(0), Some(1), None, None, None, None]);
        let r = run(&g, Some(&seed));
        assert_ne!(r.membership[0], r.membership[1]);
    }
}
