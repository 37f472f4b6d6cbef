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

//! Algorithm selection and the single call into the library.

use std::fmt;
use std::str::FromStr;

use community_core::community::{self, SpinglassParams};
use community_core::{Dendrogram, Graph, ProgressHandler, SeedConstraint};

use crate::config::DetectionConfig;
use crate::error::{Error, Result};

/// Numeric algorithm ids of the boundary. The ids are stable.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmSelector {
    EdgeBetweenness = 0,
    FastGreedy = 1,
    Infomap = 2,
    LabelPropagation = 3,
    LeadingEigenvector = 4,
    Louvain = 5,
    Optimal = 6,
    Spinglass = 7,
    Walktrap = 8,
    FastGreedySeed = 9,
    LouvainSeed = 10,
    EdgeBetweennessSeed = 11,
    Leiden = 12,
}

impl AlgorithmSelector {
    pub const ALL: [AlgorithmSelector; 13] = [
        AlgorithmSelector::EdgeBetweenness,
        AlgorithmSelector::FastGreedy,
        AlgorithmSelector::Infomap,
        AlgorithmSelector::LabelPropagation,
        AlgorithmSelector::LeadingEigenvector,
        AlgorithmSelector::Louvain,
        AlgorithmSelector::Optimal,
        AlgorithmSelector::Spinglass,
        AlgorithmSelector::Walktrap,
        AlgorithmSelector::FastGreedySeed,
        AlgorithmSelector::LouvainSeed,
        AlgorithmSelector::EdgeBetweennessSeed,
        AlgorithmSelector::Leiden,
    ];

    /// Name used by the host glue.
    pub fn name(self) -> &'static str {
        match self {
            AlgorithmSelector::EdgeBetweenness => "edgeBetweenness",
            AlgorithmSelector::FastGreedy => "fastGreedy",
            AlgorithmSelector::Infomap => "infomap",
            AlgorithmSelector::LabelPropagation => "labelPropagation",
            AlgorithmSelector::LeadingEigenvector => "leadingEigenvector",
            AlgorithmSelector::Louvain => "louvain",
            AlgorithmSelector::Optimal => "optimal",
            AlgorithmSelector::Spinglass => "spinglass",
            AlgorithmSelector::Walktrap => "walktrap",
            AlgorithmSelector::FastGreedySeed => "fastGreedySeed",
            AlgorithmSelector::LouvainSeed => "louvainSeed",
            AlgorithmSelector::EdgeBetweennessSeed => "edgeBetweennessSeed",
            AlgorithmSelector::Leiden => "leiden",
        }
    }

    /// True for the variants that require a seed assignment.
    pub fn is_seeded(self) -> bool {
        matches!(
            self,
            AlgorithmSelector::FastGreedySeed
                | AlgorithmSelector::LouvainSeed
                | AlgorithmSelector::EdgeBetweennessSeed
        )
    }
}

impl TryFrom<i32> for AlgorithmSelector {
    type Error = Error;

    fn try_from(id: i32) -> Result<Self> {
        usize::try_from(id)
            .ok()
            .and_then(|i| AlgorithmSelector::ALL.get(i).copied())
            .ok_or_else(|| Error::UnsupportedAlgorithm(id.to_string()))
    }
}

impl FromStr for AlgorithmSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AlgorithmSelector::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| Error::UnsupportedAlgorithm(s.to_string()))
    }
}

impl fmt::Display for AlgorithmSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a library routine handed back, before normalization.
#[derive(Clone, Debug, PartialEq)]
pub enum RawOutput {
    /// Membership plus a modularity trajectory.
    Trace {
        membership: Vec<usize>,
        trace: Vec<f64>,
    },
    /// Membership plus the modularity, if the routine reports it.
    Scalar {
        membership: Vec<usize>,
        modularity: Option<f64>,
    },
    /// Merge matrix plus the modularity after each merge.
    Dendrogram {
        dendrogram: Dendrogram,
        trace: Vec<f64>,
    },
}

/// One fully parameterized library call.
#[derive(Clone, Debug, PartialEq)]
pub enum Algorithm {
    EdgeBetweenness {
        seed: Option<SeedConstraint>,
    },
    FastGreedy {
        seed: Option<SeedConstraint>,
    },
    Infomap {
        trials: usize,
        rng_seed: u64,
    },
    LabelPropagation {
        max_sweeps: usize,
        rng_seed: u64,
    },
    LeadingEigenvector {
        max_sweeps: usize,
    },
    Louvain {
        resolution: f64,
        threshold: f64,
        rng_seed: u64,
        seed: Option<SeedConstraint>,
    },
    Leiden {
        resolution: f64,
        max_levels: usize,
        rng_seed: u64,
    },
    Optimal {
        max_component: usize,
    },
    Spinglass {
        params: SpinglassParams,
        rng_seed: u64,
    },
    Walktrap {
        steps: usize,
    },
}

impl Algorithm {
    /// Resolve a selector. Seeded selectors need `seed`; the others ignore
    /// it.
    pub fn new(
        selector: AlgorithmSelector,
        config: &DetectionConfig,
        seed: Option<SeedConstraint>,
    ) -> Result<Self> {
        let rng_seed = config.rng_seed;
        let required = |seed: Option<SeedConstraint>| {
            seed.map(Some).ok_or_else(|| {
                Error::InvalidArgument(format!("{selector} requires a seed membership"))
            })
        };
        Ok(match selector {
            AlgorithmSelector::EdgeBetweenness => Algorithm::EdgeBetweenness { seed: None },
            AlgorithmSelector::EdgeBetweennessSeed => Algorithm::EdgeBetweenness {
                seed: required(seed)?,
            },
            AlgorithmSelector::FastGreedy => Algorithm::FastGreedy { seed: None },
            AlgorithmSelector::FastGreedySeed => Algorithm::FastGreedy {
                seed: required(seed)?,
            },
            AlgorithmSelector::Infomap => Algorithm::Infomap {
                trials: config.infomap_trials,
                rng_seed,
            },
            AlgorithmSelector::LabelPropagation => Algorithm::LabelPropagation {
                max_sweeps: config.label_propagation_max_sweeps,
                rng_seed,
            },
            AlgorithmSelector::LeadingEigenvector => Algorithm::LeadingEigenvector {
                max_sweeps: config.leading_eigenvector_max_sweeps,
            },
            AlgorithmSelector::Louvain | AlgorithmSelector::LouvainSeed => Algorithm::Louvain {
                resolution: config.louvain_resolution,
                threshold: config.louvain_threshold,
                rng_seed,
                seed: if selector.is_seeded() {
                    required(seed)?
                } else {
                    None
                },
            },
            AlgorithmSelector::Leiden => Algorithm::Leiden {
                resolution: config.leiden_resolution,
                max_levels: config.leiden_max_levels,
                rng_seed,
            },
            AlgorithmSelector::Optimal => Algorithm::Optimal {
                max_component: config.optimal_max_component,
            },
            AlgorithmSelector::Spinglass => Algorithm::Spinglass {
                params: config.spinglass.into(),
                rng_seed,
            },
            AlgorithmSelector::Walktrap => Algorithm::Walktrap {
                steps: config.walktrap_steps,
            },
        })
    }

    pub fn selector(&self) -> AlgorithmSelector {
        match self {
            Algorithm::EdgeBetweenness { seed: None } => AlgorithmSelector::EdgeBetweenness,
            Algorithm::EdgeBetweenness { seed: Some(_) } => AlgorithmSelector::EdgeBetweennessSeed,
            Algorithm::FastGreedy { seed: None } => AlgorithmSelector::FastGreedy,
            Algorithm::FastGreedy { seed: Some(_) } => AlgorithmSelector::FastGreedySeed,
            Algorithm::Infomap { .. } => AlgorithmSelector::Infomap,
            Algorithm::LabelPropagation { .. } => AlgorithmSelector::LabelPropagation,
            Algorithm::LeadingEigenvector { .. } => AlgorithmSelector::LeadingEigenvector,
            Algorithm::Louvain { seed: None, .. } => AlgorithmSelector::Louvain,
            Algorithm::Louvain { seed: Some(_), .. } => AlgorithmSelector::LouvainSeed,
            Algorithm::Leiden { .. } => AlgorithmSelector::Leiden,
            Algorithm::Optimal { .. } => AlgorithmSelector::Optimal,
            Algorithm::Spinglass { .. } => AlgorithmSelector::Spinglass,
            Algorithm::Walktrap { .. } => AlgorithmSelector::Walktrap,
        }
    }

    /// Run the library routine.
    pub fn run(
        &self,
        graph: &Graph,
        progress: &mut dyn ProgressHandler,
    ) -> community_core::Result<RawOutput> {
        let output = match self {
            Algorithm::EdgeBetweenness { seed } => {
                let r = community::edge_betweenness(graph, seed.as_ref(), progress)?;
                RawOutput::Trace {
                    membership: r.membership,
                    trace: r.modularity,
                }
            }
            Algorithm::FastGreedy { seed } => {
                let r = community::fast_greedy(graph, seed.as_ref(), progress)?;
                RawOutput::Trace {
                    membership: r.membership,
                    trace: r.modularity,
                }
            }
            Algorithm::Infomap { trials, rng_seed } => {
                let r = community::infomap(graph, *trials, *rng_seed, progress)?;
                RawOutput::Scalar {
                    membership: r.membership,
                    modularity: None,
                }
            }
            Algorithm::LabelPropagation {
                max_sweeps,
                rng_seed,
            } => RawOutput::Scalar {
                membership: community::label_propagation(graph, *max_sweeps, *rng_seed, progress)?,
                modularity: None,
            },
            Algorithm::LeadingEigenvector { max_sweeps } => {
                let p = community::leading_eigenvector(graph, *max_sweeps, progress)?;
                RawOutput::Scalar {
                    membership: p.membership,
                    modularity: Some(p.modularity),
                }
            }
            Algorithm::Louvain {
                resolution,
                threshold,
                rng_seed,
                seed,
            } => {
                let r = community::louvain(
                    graph,
                    seed.as_ref(),
                    *resolution,
                    *threshold,
                    *rng_seed,
                    progress,
                )?;
                RawOutput::Trace {
                    membership: r.membership,
                    trace: r.modularity,
                }
            }
            Algorithm::Leiden {
                resolution,
                max_levels,
                rng_seed,
            } => RawOutput::Scalar {
                membership: community::leiden(graph, *resolution, *max_levels, *rng_seed, progress)?,
                modularity: None,
            },
            Algorithm::Optimal { max_component } => {
                let p = community::optimal_modularity(graph, *max_component, progress)?;
                RawOutput::Scalar {
                    membership: p.membership,
                    modularity: Some(p.modularity),
                }
            }
            Algorithm::Spinglass { params, rng_seed } => {
                let r = community::spinglass(graph, params, *rng_seed, progress)?;
                RawOutput::Scalar {
                    membership: r.membership,
                    modularity: None,
                }
            }
            Algorithm::Walktrap { steps } => {
                let r = community::walktrap(graph, *steps, progress)?;
                RawOutput::Dendrogram {
                    dendrogram: r.dendrogram,
                    trace: r.modularity,
                }
            }
        };
        Ok(output)
    }
}
