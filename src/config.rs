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

//! Tuning constants of the algorithms.
//!
//! The C boundary always runs with [`DetectionConfig::default`]. Rust
//! callers and the Python binding can override any subset of the fields
//! from JSON; missing fields keep their defaults.

use community_core::community::SpinglassParams;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectionConfig {
    /// Seed of every randomized algorithm.
    pub rng_seed: u64,
    pub infomap_trials: usize,
    pub label_propagation_max_sweeps: usize,
    /// Jacobi sweep budget per split.
    pub leading_eigenvector_max_sweeps: usize,
    pub louvain_resolution: f64,
    /// Minimum modularity gain for Louvain to start another level.
    pub louvain_threshold: f64,
    pub leiden_resolution: f64,
    pub leiden_max_levels: usize,
    /// Largest connected component the exact search accepts.
    pub optimal_max_component: usize,
    pub spinglass: SpinglassConfig,
    pub walktrap_steps: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig {
            rng_seed: 42,
            infomap_trials: 5,
            label_propagation_max_sweeps: 1000,
            leading_eigenvector_max_sweeps: 100,
            louvain_resolution: 1.0,
            louvain_threshold: 1e-7,
            leiden_resolution: 1.0,
            leiden_max_levels: 10,
            optimal_max_component: 50,
            spinglass: SpinglassConfig::default(),
            walktrap_steps: 4,
        }
    }
}

impl DetectionConfig {
    /// Parse a partial JSON override, e.g. `{"rng_seed": 7}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidArgument(format!("invalid configuration: {e}")))
    }
}

/// Annealing schedule of the spin-glass model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpinglassConfig {
    pub spins: usize,
    pub start_temp: f64,
    pub stop_temp: f64,
    pub cool_fact: f64,
    pub gamma: f64,
    pub sweeps_per_temp: usize,
}

impl Default for SpinglassConfig {
    fn default() -> Self {
        SpinglassParams::default().into()
    }
}

impl From<SpinglassParams> for SpinglassConfig {
    fn from(p: SpinglassParams) -> Self {
        SpinglassConfig {
            spins: p.spins,
            start_temp: p.start_temp,
            stop_temp: p.stop_temp,
            cool_fact: p.cool_fact,
            gamma: p.gamma,
            sweeps_per_temp: p.sweeps_per_temp,
        }
    }
}

impl From<SpinglassConfig> for SpinglassParams {
    fn from(c: SpinglassConfig) -> Self {
        SpinglassParams {
            spins: c.spins,
            start_temp: c.start_temp,
            stop_temp: c.stop_temp,
            cool_fact: c.cool_fact,
            gamma: c.gamma,
            sweeps_per_temp: c.sweeps_per_temp,
        }
    }
}
