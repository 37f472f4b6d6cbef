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

use community_core::SeedConstraint;

use crate::error::{Error, Result};

/// Per-vertex seed array borrowed from the host for one call.
///
/// Entries are non-negative community ids or `-1` for an unconstrained
/// vertex. Nothing is validated until a seeded algorithm asks for the
/// constraint, so non-seeded algorithms never look at it.
#[derive(Clone, Copy, Debug)]
pub struct SeedView<'a> {
    values: &'a [f64],
}

impl<'a> SeedView<'a> {
    pub fn new(values: &'a [f64]) -> Self {
        SeedView { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Validate against the graph and convert to a library constraint.
    pub fn to_constraint(&self, vertex_count: usize) -> Result<SeedConstraint> {
        SeedConstraint::from_reals(self.values, vertex_count)
            .map_err(|e| Error::InvalidArgument(e.to_string()))
    }
}

impl<'a> From<&'a [f64]> for SeedView<'a> {
    fn from(values: &'a [f64]) -> Self {
        SeedView::new(values)
    }
}
