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

//! # community-detection
//!
//! Community detection over flat edge lists, for hosts that talk to the
//! library through raw memory: a C caller or a WebAssembly module's
//! JavaScript glue.
//!
//! A request names one of the algorithms of [`AlgorithmSelector`], passes a
//! vertex count and a flat `[u0, v0, u1, v1, ...]` edge array, and gets back
//! a [`ResultEnvelope`]: a membership, a modularity trace and the best
//! modularity. The [`ffi`] module exports the same thing as C functions that
//! publish the envelope into a per-thread result slot.
//!
//! ```rust
//! use community_detection::{detect, AlgorithmSelector};
//!
//! // two triangles joined by a bridge
//! let edges = [0., 1., 1., 2., 0., 2., 2., 3., 3., 4., 4., 5., 3., 5.];
//! let result = detect(AlgorithmSelector::Louvain, 6, &edges, None).unwrap();
//! assert_eq!(result.membership, vec![0, 0, 0, 1, 1, 1]);
//! assert!((result.best_modularity - 5.0 / 14.0).abs() < 1e-12);
//! ```

pub mod algorithm;
pub mod builder;
pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod ffi;
pub mod progress;
pub mod seed;
pub mod store;

#[cfg(feature = "python")]
mod python;

pub use algorithm::{Algorithm, AlgorithmSelector, RawOutput};
pub use config::DetectionConfig;
pub use dispatch::Dispatcher;
pub use envelope::ResultEnvelope;
pub use error::{Error, Result, Status};
pub use progress::{ProgressSink, SinkError};
pub use seed::SeedView;
pub use store::{ResultBuffer, ResultHandle, ResultStore};

/// Run one algorithm with the default configuration and no progress sink.
pub fn detect(
    selector: AlgorithmSelector,
    vertex_count: i64,
    edges: &[f64],
    seed: Option<&[f64]>,
) -> Result<ResultEnvelope> {
    Dispatcher::default().detect(selector, vertex_count, edges, seed.map(SeedView::new), None)
}
