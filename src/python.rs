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

use pyo3::exceptions::{PyNotImplementedError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use pyo3::wrap_pyfunction;

use crate::algorithm::AlgorithmSelector;
use crate::builder::build_graph;
use crate::config::DetectionConfig;
use crate::dispatch::Dispatcher;
use crate::error::Error;
use crate::progress::{ProgressSink, SinkError};
use crate::seed::SeedView;

impl From<Error> for PyErr {
    fn from(err: Error) -> PyErr {
        match err {
            Error::InvalidArgument(_) => PyValueError::new_err(err.to_string()),
            Error::UnsupportedAlgorithm(_) => PyNotImplementedError::new_err(err.to_string()),
            Error::UpstreamAlgorithmFailure { .. } => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

/// Python callable used as a progress sink.
struct PyCallbackSink<'py> {
    callback: Bound<'py, PyAny>,
}

impl ProgressSink for PyCallbackSink<'_> {
    fn report(&mut self, percent: f64) -> Result<(), SinkError> {
        self.callback
            .call1((percent,))
            .map(|_| ())
            .map_err(|e| SinkError(e.to_string()))
    }
}

/// Detect communities in an undirected, unweighted graph.
///
/// Args:
///     algorithm (str): Algorithm name, e.g. ``"louvain"`` or ``"fastGreedySeed"``.
///     vertex_count (int): Number of vertices.
///     edges (list[float]): Flat edge list ``[u0, v0, u1, v1, ...]``.
///     seed (list[float], optional): Seed community per vertex, ``-1`` for
///         none. Required by the seeded algorithms, ignored by the others.
///     config (str, optional): JSON object overriding tuning constants.
///     progress (callable, optional): Called with a percentage while the
///         algorithm runs. Exceptions it raises are ignored.
///
/// Returns:
///     dict with ``membership``, ``modularityTrace`` and ``bestModularity``.
///
/// Raises:
///     ValueError: If the graph, seed or configuration is invalid.
///     NotImplementedError: If the algorithm name is unknown.
///     RuntimeError: If the algorithm fails on this graph.
#[pyfunction]
#[pyo3(
    signature = (algorithm, vertex_count, edges, /, seed=None, config=None, progress=None),
    text_signature = "(algorithm, vertex_count, edges, /, seed=None, config=None, progress=None)"
)]
pub fn detect_communities<'py>(
    py: Python<'py>,
    algorithm: &str,
    vertex_count: i64,
    edges: Vec<f64>,
    seed: Option<Vec<f64>>,
    config: Option<&str>,
    progress: Option<Bound<'py, PyAny>>,
) -> PyResult<Bound<'py, PyDict>> {
    let selector: AlgorithmSelector = algorithm.parse()?;
    let config = match config {
        Some(json) => DetectionConfig::from_json(json)?,
        None => DetectionConfig::default(),
    };
    let mut sink = progress.map(|callback| PyCallbackSink { callback });
    let envelope = Dispatcher::new(config).detect(
        selector,
        vertex_count,
        &edges,
        seed.as_deref().map(SeedView::new),
        sink.as_mut().map(|s| s as &mut dyn ProgressSink),
    )?;

    let result = PyDict::new(py);
    result.set_item("membership", envelope.membership)?;
    result.set_item("modularityTrace", envelope.modularity_trace)?;
    result.set_item("bestModularity", envelope.best_modularity)?;
    Ok(result)
}

/// Modularity of ``membership`` on the graph given by ``vertex_count`` and
/// the flat ``edges`` list.
#[pyfunction]
#[pyo3(signature = (vertex_count, edges, membership, /))]
pub fn modularity(vertex_count: i64, edges: Vec<f64>, membership: Vec<usize>) -> PyResult<f64> {
    let graph = build_graph(vertex_count, &edges)?;
    community_core::modularity(&graph, &membership).map_err(|e| PyValueError::new_err(e.to_string()))
}

#[pymodule]
pub fn community_detection(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(detect_communities, m)?)?;
    m.add_function(wrap_pyfunction!(modularity, m)?)?;
    let names: Vec<&str> = AlgorithmSelector::ALL.iter().map(|a| a.name()).collect();
    m.add("ALGORITHMS", names)?;
    Ok(())
}
