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

//! Helpers shared by the randomized and multi-level algorithms.

use foldhash::{HashMap, HashMapExt};
use rand::prelude::*;
use rand_pcg::Pcg64;

/// RNG used by every randomized algorithm.
pub(crate) type CommunityRng = Pcg64;

/// Deterministic RNG from a seed. Entropy seeding is not offered so runs
/// are reproducible and the crate builds for `wasm32-unknown-unknown`.
#[inline]
pub(crate) fn build_rng(seed: u64) -> CommunityRng {
    Pcg64::seed_from_u64(seed)
}

/// Shuffle a vector of node indices in-place.
#[inline]
pub(crate) fn shuffle_nodes(rng: &mut CommunityRng, nodes: &mut [usize]) {
    nodes.shuffle(rng);
}

/// Choose a random element from a non-empty slice of candidates.
#[inline]
pub(crate) fn choose_random(rng: &mut CommunityRng, candidates: &[usize]) -> usize {
    debug_assert!(!candidates.is_empty());
    let idx = rng.random_range(0..candidates.len());
    candidates[idx]
}

/// Renumber community ids to `0..k` in order of first appearance.
pub(crate) fn relabel(membership: &[usize]) -> Vec<usize> {
    let mut map: HashMap<usize, usize> = HashMap::with_capacity(membership.len());
    membership
        .iter()
        .map(|&c| {
            let next = map.len();
            *map.entry(c).or_insert(next)
        })
        .collect()
}

/// Number of distinct ids in a relabelled membership.
#[inline]
pub(crate) fn community_count(membership: &[usize]) -> usize {
    membership.iter().max().map_or(0, |&c| c + 1)
}

/// Vertices of each community of a relabelled membership.
pub(crate) fn group_by_labels(membership: &[usize]) -> Vec<Vec<usize>> {
    let mut groups = vec![Vec::new(); community_count(membership)];
    for (v, &c) in membership.iter().enumerate() {
        groups[c].push(v);
    }
    groups
}

/// Project a membership of aggregated nodes back onto original vertices.
pub(crate) fn flatten(node_of_vertex: &[usize], membership_of_node: &[usize]) -> Vec<usize> {
    node_of_vertex
        .iter()
        .map(|&node| membership_of_node[node])
        .collect()
}
