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

//! Partial pre-assignment of vertices to communities.
//!
//! Seeded algorithms treat the constraint as follows: vertices that share a
//! seed id start in the same community and stay together, and communities
//! that carry different seed ids are never merged. Unseeded vertices are
//! free.

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Per-vertex seed: `Some(id)` pins the vertex to seed community `id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedConstraint {
    seeds: Vec<Option<usize>>,
}

impl SeedConstraint {
    /// Wrap an already validated seed vector.
    pub fn new(seeds: Vec<Option<usize>>) -> Self {
        SeedConstraint { seeds }
    }

    /// Read a host seed array where `-1` marks an unconstrained vertex.
    pub fn from_reals(values: &[f64], vertex_count: usize) -> Result<Self> {
        if values.len() != vertex_count {
            return Err(Error::LengthMismatch {
                what: "seed membership",
                expected: vertex_count,
                found: values.len(),
            });
        }
        let seeds = values
            .iter()
            .enumerate()
            .map(|(vertex, &value)| {
                if value == -1.0 {
                    Ok(None)
                } else if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
                    Ok(Some(value as usize))
                } else {
                    Err(Error::InvalidSeed { vertex, value })
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(SeedConstraint { seeds })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    #[inline]
    pub fn get(&self, vertex: usize) -> Option<usize> {
        self.seeds.get(vertex).copied().flatten()
    }

    pub fn as_slice(&self) -> &[Option<usize>] {
        &self.seeds
    }

    /// Vertices grouped by seed id, in order of first appearance.
    pub fn groups(&self) -> IndexMap<usize, Vec<usize>> {
        let mut groups: IndexMap<usize, Vec<usize>> = IndexMap::new();
        for (vertex, seed) in self.seeds.iter().enumerate() {
            if let Some(id) = seed {
                groups.entry(*id).or_default().push(vertex);
            }
        }
        groups
    }

    /// Initial partition: one community per seed group, then a singleton
    /// for every unseeded vertex.
    ///
    /// Returns the membership and the seed id carried by each community.
    pub fn initial_partition(&self) -> (Vec<usize>, Vec<Option<usize>>) {
        let n = self.seeds.len();
        let mut membership = vec![0; n];
        let mut labels = Vec::new();
        for (id, vertices) in self.groups() {
            for v in vertices {
                membership[v] = labels.len();
            }
            labels.push(Some(id));
        }
        for (vertex, seed) in self.seeds.iter().enumerate() {
            if seed.is_none() {
                membership[vertex] = labels.len();
                labels.push(None);
            }
        }
        (membership, labels)
    }

    pub(crate) fn check_len(&self, vertex_count: usize) -> Result<()> {
        if self.seeds.len() == vertex_count {
            Ok(())
        } else {
            Err(Error::LengthMismatch {
                what: "seed membership",
                expected: vertex_count,
                found: self.seeds.len(),
            })
        }
    }
}

/// True when two seed labels may share a community.
#[inline]
pub(crate) fn compatible(a: Option<usize>, b: Option<usize>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => x == y,
        _ => true,
    }
}

/// Label of the union of two compatible communities.
#[inline]
pub(crate) fn join(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    a.or(b)
}
