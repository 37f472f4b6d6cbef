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
// https://arxiv.org/abs/0707.0609

use super::network::Network;
use crate::common::{build_rng, shuffle_nodes, CommunityRng};
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::progress::{Progress, ProgressHandler};

const EPSILON: f64 = 1e-10;
const MAX_PASSES: usize = 20;

/// Result of [`infomap`].
#[derive(Clone, Debug, PartialEq)]
pub struct InfomapResult {
    pub membership: Vec<usize>,
    /// Two-level map equation of `membership`, in bits.
    pub codelength: f64,
}

/// Two-level Infomap (Rosvall and Bergstrom).
///
/// Minimizes the map equation of a random walk on the graph. Each trial
/// moves nodes greedily between neighboring modules and aggregates modules
/// into nodes until nothing moves. The shortest description over `trials`
/// trials wins, unless a single module describes the walk at least as
/// well, in which case every vertex is put in module 0. An edgeless graph
/// yields singletons and a codelength of zero.
pub fn infomap(
    graph: &Graph,
    trials: usize,
    rng_seed: u64,
    progress: &mut dyn ProgressHandler,
) -> Result<InfomapResult> {
    if trials == 0 {
        return Err(Error::InvalidParameter {
            name: "trials",
            value: 0.0,
        });
    }
    let n = graph.node_count();
    let network = Network::from_graph(graph);
    let mut progress = Progress::new(progress, "infomap");
    if network.total_weight == 0.0 {
        progress.finish();
        return Ok(InfomapResult {
            membership: (0..n).collect(),
            codelength: 0.0,
        });
    }

    let mut rng = build_rng(rng_seed);
    let mut best: Option<InfomapResult> = None;
    for trial in 0..trials {
        let membership = run_trial(&network, &mut rng);
        let codelength = map_equation(&network, &membership);
        if best.as_ref().map_or(true, |b| codelength < b.codelength - EPSILON) {
            best = Some(InfomapResult {
                membership,
                codelength,
            });
        }
        progress.update(trial + 1, trials);
    }
    progress.finish();

    let single = vec![0; n];
    let one_module = map_equation(&network, &single);
    match best {
        Some(found) if found.codelength < one_module - EPSILON => Ok(found),
        _ => Ok(InfomapResult {
            membership: single,
            codelength: one_module,
        }),
    }
}

fn run_trial(network: &Network, rng: &mut CommunityRng) -> Vec<usize> {
    let mut level = network.clone();
    let mut node_to_module: Vec<usize> = (0..level.len()).collect();
    loop {
        if !move_nodes(&level, &mut node_to_module, rng) {
            break;
        }
        let (next, _) = level.aggregate(&node_to_module);
        if next.len() == level.len() {
            break;
        }
        level = next;
        node_to_module = (0..level.len()).collect();
    }
    level.project(&node_to_module)
}

#[inline]
fn plogp(p: f64) -> f64 {
    if p > 0.0 {
        p * p.log2()
    } else {
        0.0
    }
}

/// Map equation of a partition of the original vertices of `network`.
pub(super) fn map_equation(network: &Network, membership: &[usize]) -> f64 {
    let m2 = network.total_weight;
    if m2 == 0.0 {
        return 0.0;
    }
    let k = membership.iter().max().map_or(0, |&c| c + 1);
    let mut volume = vec![0.0; k];
    let mut inside = vec![0.0; k];
    let mut node_entropy = 0.0;
    for node in 0..network.len() {
        let c = membership[node];
        volume[c] += network.degree[node];
        node_entropy += plogp(network.degree[node] / m2);
        for (&nb, &w) in &network.adj[node] {
            if membership[nb] == c {
                inside[c] += w;
            }
        }
    }
    let mut codebook = Codebook::default();
    for c in 0..k {
        codebook.add((volume[c] - inside[c]) / m2, volume[c] / m2);
    }
    codebook.length() - node_entropy
}

/// Module-dependent terms of the map equation, in flow units.
#[derive(Clone, Copy, Debug, Default)]
struct Codebook {
    exit: f64,
    exit_log_exit: f64,
    size_log_size: f64,
}

impl Codebook {
    fn add(&mut self, exit: f64, volume: f64) {
        self.exit += exit;
        self.exit_log_exit += plogp(exit);
        self.size_log_size += plogp(exit + volume);
    }

    fn remove(&mut self, exit: f64, volume: f64) {
        self.exit -= exit;
        self.exit_log_exit -= plogp(exit);
        self.size_log_size -= plogp(exit + volume);
    }

    fn length(&self) -> f64 {
        plogp(self.exit) - 2.0 * self.exit_log_exit + self.size_log_size
    }
}

/// Greedy node moves. Returns true if any node changed module.
fn move_nodes(network: &Network, node_to_module: &mut [usize], rng: &mut CommunityRng) -> bool {
    let m2 = network.total_weight;
    let len = network.len();
    // module volume and internal weight, in edge units
    let mut volume = vec![0.0; len];
    let mut inside = vec![0.0; len];
    for node in 0..len {
        let c = node_to_module[node];
        volume[c] += network.degree[node];
        for (&nb, &w) in &network.adj[node] {
            if node_to_module[nb] == c {
                inside[c] += w;
            }
        }
    }
    let mut codebook = Codebook::default();
    for c in 0..len {
        codebook.add((volume[c] - inside[c]) / m2, volume[c] / m2);
    }

    let mut nodes: Vec<usize> = (0..len).collect();
    let mut moved = false;
    for _ in 0..MAX_PASSES {
        let mut moves = 0;
        shuffle_nodes(rng, &mut nodes);
        for &node in &nodes {
            let current = node_to_module[node];
            let k = network.degree[node];
            let self_weight = network.adj[node].get(&node).copied().unwrap_or(0.0);
            let weights = network.neighbor_weights(node, node_to_module);
            let to_current = weights.get(&current).copied().unwrap_or(0.0);

            let old_exit = (volume[current] - inside[current]) / m2;
            let old_vol = volume[current] / m2;
            let left_vol = volume[current] - k;
            let left_inside = inside[current] - self_weight - 2.0 * to_current;

            let mut base = codebook;
            base.remove(old_exit, old_vol);
            base.add((left_vol - left_inside) / m2, left_vol / m2);

            // strict improvement, lowest module id on ties
            let mut best = (current, -EPSILON);
            for (&target, &w) in &weights {
                if target == current {
                    continue;
                }
                let mut trial = base;
                trial.remove((volume[target] - inside[target]) / m2, volume[target] / m2);
                let joined_vol = volume[target] + k;
                let joined_inside = inside[target] + self_weight + 2.0 * w;
                trial.add((joined_vol - joined_inside) / m2, joined_vol / m2);
                let delta = trial.length() - codebook.length();
                if delta < best.1 || (delta == best.1 && best.0 != current && target < best.0) {
                    best = (target, delta);
                }
            }

            if best.0 != current {
                let target = best.0;
                let w = weights.get(&target).copied().unwrap_or(0.0);
                codebook.remove((volume[target] - inside[target]) / m2, volume[target] / m2);
                codebook.remove(old_exit, old_vol);
                volume[current] = left_vol;
                inside[current] = left_inside;
                volume[target] += k;
                inside[target] += self_weight + 2.0 * w;
                codebook.add((volume[current] - inside[current]) / m2, volume[current] / m2);
                codebook.add((volume[target] - inside[target]) / m2, volume[target] / m2);
                node_to_module[node] = target;
                moves += 1;
            }
        }
        if moves == 0 {
            break;
        }
        moved = true;
    }
    moved
}
