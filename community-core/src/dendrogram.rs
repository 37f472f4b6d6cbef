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

//! Merge matrices produced by agglomerative algorithms.
//!
//! Leaves are numbered `0..leaf_count`. Merge `i` joins two existing
//! clusters and creates cluster `leaf_count + i`.

use fixedbitset::FixedBitSet;

use crate::common::relabel;
use crate::error::{Error, Result};

/// A validated sequence of pairwise merges over `leaf_count` leaves.
///
/// The dendrogram may be incomplete: disconnected graphs, or seeded runs
/// that forbid some merges, stop before everything is one cluster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dendrogram {
    leaf_count: usize,
    merges: Vec<[usize; 2]>,
}

impl Dendrogram {
    /// Validate a merge matrix.
    pub fn new(leaf_count: usize, merges: Vec<[usize; 2]>) -> Result<Self> {
        check_merges(leaf_count, &merges)?;
        Ok(Dendrogram { leaf_count, merges })
    }

    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    #[inline]
    pub fn merges(&self) -> &[[usize; 2]] {
        &self.merges
    }

    /// Number of merges performed.
    #[inline]
    pub fn len(&self) -> usize {
        self.merges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }

    /// Membership after replaying the first `steps` merges.
    pub fn cut(&self, steps: usize) -> Result<Vec<usize>> {
        community_to_membership(&self.merges, self.leaf_count, steps)
    }
}

fn check_merges(leaf_count: usize, merges: &[[usize; 2]]) -> Result<()> {
    let total = leaf_count + merges.len();
    let mut used = FixedBitSet::with_capacity(total);
    for (i, &[a, b]) in merges.iter().enumerate() {
        let created = leaf_count + i;
        for c in [a, b] {
            if c >= created {
                return Err(Error::InvalidMerges(format!(
                    "merge {i} references cluster {c} before it exists"
                )));
            }
            if used.put(c) {
                return Err(Error::InvalidMerges(format!(
                    "merge {i} reuses cluster {c}"
                )));
            }
        }
        if a == b {
            return Err(Error::InvalidMerges(format!("merge {i} joins {a} with itself")));
        }
    }
    Ok(())
}

/// Membership of `vertex_count` leaves after the first `steps` merges.
///
/// Community ids are renumbered in order of first appearance by vertex.
pub fn community_to_membership(
    merges: &[[usize; 2]],
    vertex_count: usize,
    steps: usize,
) -> Result<Vec<usize>> {
    if steps > merges.len() {
        return Err(Error::InvalidMerges(format!(
            "cannot take {steps} steps of a {}-merge dendrogram",
            merges.len()
        )));
    }
    check_merges(vertex_count, &merges[..steps])?;

    // union-find over leaves and created clusters
    let mut parent: Vec<usize> = (0..vertex_count + steps).collect();
    for (i, &[a, b]) in merges[..steps].iter().enumerate() {
        let created = vertex_count + i;
        parent[a] = created;
        parent[b] = created;
    }
    let membership: Vec<usize> = (0..vertex_count)
        .map(|v| {
            let mut root = v;
            while parent[root] != root {
                root = parent[root];
            }
            root
        })
        .collect();
    Ok(relabel(&membership))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dendrogram {
        // ((0 1) 2) and (3 4)
        Dendrogram::new(5, vec![[0, 1], [3, 4], [5, 2], [7, 6]]).unwrap()
    }

    #[test]
    fn cut_replays_prefix() {
        let d = sample();
        assert_eq!(d.cut(0).unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(d.cut(1).unwrap(), vec![0, 0, 1, 2, 3]);
        assert_eq!(d.cut(3).unwrap(), vec![0, 0, 0, 1, 1]);
        assert_eq!(d.cut(4).unwrap(), vec![0; 5]);
    }

    #[test]
    fn too_many_steps_is_an_error() {
        assert!(matches!(sample().cut(5), Err(Error::InvalidMerges(_))));
    }

    #[test]
    fn malformed_merges_are_rejected() {
        assert!(Dendrogram::new(3, vec![[0, 5]]).is_err());
        assert!(Dendrogram::new(3, vec![[0, 1], [0, 2]]).is_err());
        assert!(Dendrogram::new(3, vec![[1, 1]]).is_err());
        assert!(community_to_membership(&[[0, 3]], 3, 1).is_err());
    }

    #[test]
    fn empty_dendrogram_cuts_to_singletons() {
        let d = Dendrogram::new(3, Vec::new()).unwrap();
        assert!(d.is_empty());
        assert_eq!(d.cut(0).unwrap(), vec![0, 1, 2]);
    }
}
