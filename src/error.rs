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

use crate::algorithm::AlgorithmSelector;

/// Result alias for the boundary crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Status codes returned across the C boundary.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok = 0,
    UnsupportedAlgorithm = 1,
    InvalidArgument = 2,
    UpstreamFailure = 3,
    Internal = 4,
}

impl From<Status> for i32 {
    fn from(status: Status) -> i32 {
        status as i32
    }
}

/// Why a detection request failed. A failed request never publishes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed input: vertex count, edge list, seed or configuration.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The selector does not name a known algorithm.
    #[error("unsupported algorithm `{0}`")]
    UnsupportedAlgorithm(String),

    /// The algorithm refused or failed on well-formed input.
    #[error("{algorithm} failed: {source}")]
    UpstreamAlgorithmFailure {
        algorithm: AlgorithmSelector,
        #[source]
        source: community_core::Error,
    },
}

impl Error {
    /// Classify a library error raised while running `algorithm`.
    pub fn from_library(algorithm: AlgorithmSelector, source: community_core::Error) -> Self {
        if source.is_invalid_input() {
            Error::InvalidArgument(source.to_string())
        } else {
            Error::UpstreamAlgorithmFailure { algorithm, source }
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Error::InvalidArgument(_) => Status::InvalidArgument,
            Error::UnsupportedAlgorithm(_) => Status::UnsupportedAlgorithm,
            Error::UpstreamAlgorithmFailure { .. } => Status::UpstreamFailure,
        }
    }
}
