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

use community_core::which_max;
use serde::Serialize;

/// The one result shape every algorithm is normalized into.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    /// Canonical community id of each vertex.
    pub membership: Vec<usize>,
    pub modularity_trace: Vec<f64>,
    /// Maximum of the trace, first occurrence. NaN only for an empty trace.
    pub best_modularity: f64,
}

impl ResultEnvelope {
    pub fn new(membership: Vec<usize>, modularity_trace: Vec<f64>) -> Self {
        let best_modularity = which_max(&modularity_trace).map_or(f64::NAN, |i| modularity_trace[i]);
        ResultEnvelope {
            membership,
            modularity_trace,
            best_modularity,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.membership.len()
    }

    pub fn community_count(&self) -> usize {
        self.membership.iter().max().map_or(0, |&c| c + 1)
    }

    pub fn to_json(&self) -> String {
        // only numbers and sequences of numbers, serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_is_first_maximum() {
        let e = ResultEnvelope::new(vec![0, 0, 1], vec![-0.1, 0.3, 0.3, 0.2]);
        assert_eq!(e.best_modularity, 0.3);
        assert_eq!(e.community_count(), 2);
    }

    #[test]
    fn serializes_with_host_field_names() {
        let e = ResultEnvelope::new(vec![0, 1], vec![0.5]);
        assert_eq!(
            e.to_json(),
            r#"{"membership":[0,1],"modularityTrace":[0.5],"bestModularity":0.5}"#
        );
    }

    #[test]
    fn empty_trace_has_no_best() {
        assert!(ResultEnvelope::new(Vec::new(), Vec::new()).best_modularity.is_nan());
    }
}
