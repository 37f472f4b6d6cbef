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

//! Community detection algorithms.
//!
//! All memberships returned from this module are canonical: community ids
//! are `0..k`, numbered in order of first appearance by vertex index.

mod edge_betweenness;
mod fast_greedy;
mod infomap;
mod label_propagation;
mod leading_eigenvector;
mod leiden;
mod louvain;
mod network;
mod optimal;
mod spinglass;
mod walktrap;

pub use edge_betweenness::edge_betweenness;
pub use fast_greedy::fast_greedy;
pub use infomap::{infomap, InfomapResult};
pub use label_propagation::label_propagation;
pub use leading_eigenvector::leading_eigenvector;
pub use leiden::leiden;
pub use louvain::{louvain, LouvainResult};
pub use optimal::optimal_modularity;
pub use spinglass::{spinglass, SpinglassParams, SpinglassResult};
pub use walktrap::{walktrap, WalktrapResult};

use crate::dendrogram::Dendrogram;

/// Output of the agglomerative algorithms (fast greedy, edge betweenness).
#[derive(Clone, Debug, PartialEq)]
pub struct HierarchicalResult {
    /// Merges over the starting communities of `initial`.
    pub dendrogram: Dendrogram,
    /// Starting community of each vertex. Without a seed every vertex
    /// starts alone; with one, each seed group starts as one community.
    pub initial: Vec<usize>,
    /// Modularity before any merge and after each merge.
    pub modularity: Vec<f64>,
    /// Partition at the first step of highest modularity.
    pub membership: Vec<usize>,
}

/// A single partition with its modularity.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    pub membership: Vec<usize>,
    pub modularity: f64,
}
