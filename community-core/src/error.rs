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

/// Result alias for `community-core`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by graph construction and the community algorithms.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Vertex count was negative.
    #[error("invalid vertex count {0}")]
    InvalidVertexCount(i64),

    /// The flattened edge array had an odd number of entries.
    #[error("edge array has odd length {0}")]
    OddEdgeArray(usize),

    /// An edge endpoint was not an integer in `[0, vertex_count)`.
    #[error("invalid vertex id {value} (vertex count {vertex_count})")]
    InvalidVertexId {
        /// Offending endpoint as received.
        value: f64,
        /// Vertex count of the graph being built.
        vertex_count: usize,
    },

    /// A per-vertex vector had the wrong length.
    #[error("{what} has length {found}, expected {expected}")]
    LengthMismatch {
        /// Name of the vector.
        what: &'static str,
        /// Expected length (the vertex count).
        expected: usize,
        /// Length received.
        found: usize,
    },

    /// A seed entry was neither `-1` nor a non-negative integer.
    #[error("invalid seed {value} for vertex {vertex}")]
    InvalidSeed {
        /// Vertex index.
        vertex: usize,
        /// Seed value as received.
        value: f64,
    },

    /// A tuning parameter was outside its valid range.
    #[error("invalid value {value} for parameter `{name}`")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Value as received.
        value: f64,
    },

    /// A merge matrix referenced a cluster that does not exist or was
    /// already merged, or a cut asked for more steps than it holds.
    #[error("invalid merge matrix: {0}")]
    InvalidMerges(String),

    /// An iterative solver ran out of iterations.
    #[error("{algorithm} did not converge after {iterations} iterations")]
    NotConverged {
        /// Algorithm name.
        algorithm: &'static str,
        /// Iteration budget that was exhausted.
        iterations: usize,
    },

    /// The algorithm only works on connected graphs.
    #[error("{algorithm} requires a connected graph")]
    Disconnected {
        /// Algorithm name.
        algorithm: &'static str,
    },

    /// The input exceeds what an exhaustive algorithm will attempt.
    #[error("{algorithm} refuses a component of {size} vertices (limit {limit})")]
    TooLarge {
        /// Algorithm name.
        algorithm: &'static str,
        /// Size of the offending input.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    /// An embedded optimization solver gave up.
    #[error("{algorithm} solver failed: {message}")]
    Solver {
        /// Algorithm name.
        algorithm: &'static str,
        /// Solver diagnostic.
        message: String,
    },
}

impl Error {
    /// True for errors caused by malformed input rather than by an
    /// algorithm failing on well-formed input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidVertexCount(_)
                | Error::OddEdgeArray(_)
                | Error::InvalidVertexId { .. }
                | Error::LengthMismatch { .. }
                | Error::InvalidSeed { .. }
                | Error::InvalidParameter { .. }
        )
    }
}
