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

use community_core::{graph, Graph};

use crate::error::{Error, Result};

/// Build the graph of one request from a vertex count and `2 * edgeCount`
/// reals laid out as `[u0, v0, u1, v1, ...]`.
///
/// Validation is the library's own; its errors become
/// [`Error::InvalidArgument`].
pub fn build_graph(vertex_count: i64, edges: &[f64]) -> Result<Graph> {
    graph::create(vertex_count, edges).map_err(|e| Error::InvalidArgument(e.to_string()))
}
