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

//! One request: build the graph, run one algorithm, normalize its output.

use community_core::{community_to_membership, modularity, which_max, Graph};
use tracing::debug;

use crate::algorithm::{Algorithm, AlgorithmSelector, RawOutput};
use crate::builder::build_graph;
use crate::config::DetectionConfig;
use crate::envelope::ResultEnvelope;
use crate::error::{Error, Result};
use crate::progress::{ProgressRelay, ProgressSink};
use crate::seed::SeedView;

/// Runs detection requests with a fixed configuration.
#[derive(Clone, Debug, Default)]
pub struct Dispatcher {
    config: DetectionConfig,
}

impl Dispatcher {
    pub fn new(config: DetectionConfig) -> Self {
        Dispatcher { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run `selector` on the graph given by `vertex_count` and the flat
    /// `edges` array.
    ///
    /// `seed` is only read by the seeded selectors, which fail with
    /// [`Error::InvalidArgument`] without one. Progress goes to `sink` when
    /// one is given.
    pub fn detect(
        &self,
        selector: AlgorithmSelector,
        vertex_count: i64,
        edges: &[f64],
        seed: Option<SeedView<'_>>,
        sink: Option<&mut dyn ProgressSink>,
    ) -> Result<ResultEnvelope> {
        debug!(
            algorithm = %selector,
            vertex_count,
            edge_count = edges.len() / 2,
            seeded = seed.is_some(),
            "running community detection"
        );
        let graph = build_graph(vertex_count, edges)?;
        let seed = match seed {
            Some(view) if selector.is_seeded() => Some(view.to_constraint(graph.node_count())?),
            _ => None,
        };
        let algorithm = Algorithm::new(selector, &self.config, seed)?;

        let mut relay = ProgressRelay::new(sink);
        let raw = algorithm
            .run(&graph, &mut relay)
            .map_err(|e| Error::from_library(selector, e))?;
        let envelope = normalize(&graph, selector, raw)?;

        debug!(
            algorithm = %selector,
            communities = envelope.community_count(),
            trace_len = envelope.modularity_trace.len(),
            best_modularity = envelope.best_modularity,
            "community detection finished"
        );
        Ok(envelope)
    }
}

/// Bring a library output into the envelope shape.
///
/// Scalar outputs become a one-element trace, computed with the modularity
/// evaluator when the routine did not report it. Dendrograms are cut at the
/// first step of highest modularity and the merges are not exposed.
pub fn normalize(graph: &Graph, selector: AlgorithmSelector, raw: RawOutput) -> Result<ResultEnvelope> {
    let library = |e: community_core::Error| Error::from_library(selector, e);
    match raw {
        RawOutput::Trace { membership, trace } if !trace.is_empty() => {
            Ok(ResultEnvelope::new(membership, trace))
        }
        RawOutput::Trace { membership, .. } => {
            let q = modularity(graph, &membership).map_err(library)?;
            Ok(ResultEnvelope::new(membership, vec![q]))
        }
        RawOutput::Scalar {
            membership,
            modularity: reported,
        } => {
            let q = match reported {
                Some(q) => q,
                None => modularity(graph, &membership).map_err(library)?,
            };
            Ok(ResultEnvelope::new(membership, vec![q]))
        }
        RawOutput::Dendrogram { dendrogram, trace } => {
            let steps = which_max(&trace).unwrap_or(0);
            let membership =
                community_to_membership(dendrogram.merges(), dendrogram.leaf_count(), steps)
                    .map_err(library)?;
            Ok(ResultEnvelope::new(membership, trace))
        }
    }
}
