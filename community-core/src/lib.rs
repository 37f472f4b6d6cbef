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

//! # community-core
//!
//! Community detection algorithms for unweighted, undirected graphs.
//!
//! Every algorithm takes a [`Graph`] built with [`graph::create`], an
//! optional [`SeedConstraint`] where the algorithm supports one, and a
//! [`ProgressHandler`] that receives `(stage, percent)` notifications while
//! the algorithm runs. Outputs differ by algorithm: some return a membership
//! and a modularity trajectory, some a membership alone, and walktrap returns
//! a [`Dendrogram`] that callers cut with [`community_to_membership`].
//!
//! ```rust
//! use community_core::{graph, community, modularity, NoProgress};
//!
//! // two triangles joined by a bridge
//! let edges = [0., 1., 1., 2., 0., 2., 2., 3., 3., 4., 4., 5., 3., 5.];
//! let g = graph::create(6, &edges).unwrap();
//! let result = community::fast_greedy(&g, None, &mut NoProgress).unwrap();
//! assert_eq!(result.membership, vec![0, 0, 0, 1, 1, 1]);
//! let q = modularity(&g, &result.membership).unwrap();
//! assert!((q - 5.0 / 14.0).abs() < 1e-12);
//! ```

pub mod community;
pub mod dendrogram;
pub mod error;
pub mod graph;
pub mod modularity;
pub mod progress;
pub mod seed;

mod agglomeration;
mod common;

#[cfg(test)]
pub(crate) mod test_graphs;

pub use dendrogram::{community_to_membership, Dendrogram};
pub use error::{Error, Result};
pub use graph::Graph;
pub use modularity::{modularity, which_max};
pub use progress::{NoProgress, ProgressHandler};
pub use seed::SeedConstraint;
