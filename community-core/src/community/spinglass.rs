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

//! Spin-glass community detection.
//!
//! Vertices carry one of `q` spins and the partition minimizes the Potts
//! Hamiltonian of Reichardt and Bornholdt,
//! `H = -sum_s (e_s - gamma * K_s^2 / 4m)`, where `e_s` counts the edges
//! inside spin state `s` and `K_s` is its total degree. With `gamma = 1`,
//! `H = -m * Q`. The minimum is searched by simulated annealing with
//! heat-bath updates and finished by a zero-temperature pass.
//!
//! Reference: J. Reichardt and S. Bornholdt, "Statistical mechanics of
//! community detection", Phys. Rev. E 74, 016110 (2006).

use rand::Rng;

use crate::common::{build_rng, relabel, shuffle_nodes, CommunityRng};
use crate::error::{Error, Result};
use crate::graph::{is_connected, Adjacency, Graph};
use crate::progress::{Progress, ProgressHandler};

const MAX_QUENCH_PASSES: usize = 100;

/// Annealing schedule and model parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpinglassParams {
    /// Upper bound on the number of communities.
    pub spins: usize,
    pub start_temp: f64,
    pub stop_temp: f64,
    /// Temperature multiplier per step, in `(0, 1)`.
    pub cool_fact: f64,
    /// Weight of the null model.
    pub gamma: f64,
    /// Sweeps over all vertices at each temperature.
    pub sweeps_per_temp: usize,
}

impl Default for SpinglassParams {
    fn default() -> Self {
        SpinglassParams {
            spins: 25,
            start_temp: 1.0,
            stop_temp: 0.01,
            cool_fact: 0.99,
            gamma: 1.0,
            sweeps_per_temp: 2,
        }
    }
}

impl SpinglassParams {
    fn validate(&self) -> Result<()> {
        let invalid = |name, value| Err(Error::InvalidParameter { name, value });
        if self.spins == 0 {
            return invalid("spins", 0.0);
        }
        if !(self.start_temp.is_finite() && self.start_temp > 0.0) {
            return invalid("start_temp", self.start_temp);
        }
        if !(self.stop_temp > 0.0 && self.stop_temp <= self.start_temp) {
            return invalid("stop_temp", self.stop_temp);
        }
        if !(self.cool_fact > 0.0 && self.cool_fact < 1.0) {
            return invalid("cool_fact", self.cool_fact);
        }
        if !(self.gamma.is_finite() && self.gamma >= 0.0) {
            return invalid("gamma", self.gamma);
        }
        if self.sweeps_per_temp == 0 {
            return invalid("sweeps_per_temp", 0.0);
        }
        Ok(())
    }

    fn temperature_steps(&self) -> usize {
        let mut steps = 0;
        let mut t = self.start_temp;
        while t > self.stop_temp {
            t *= self.cool_fact;
            steps += 1;
        }
        steps
    }
}

/// Result of [`spinglass`].
#[derive(Clone, Debug, PartialEq)]
pub struct SpinglassResult {
    pub membership: Vec<usize>,
    /// Hamiltonian of the final configuration.
    pub energy: f64,
}

/// Anneal a Potts model on a connected graph.
///
/// Disconnected graphs are refused with [`Error::Disconnected`]. The number
/// of spins is capped at the vertex count.
pub fn spinglass(
    graph: &Graph,
    params: &SpinglassParams,
    rng_seed: u64,
    progress: &mut dyn ProgressHandler,
) -> Result<SpinglassResult> {
    params.validate()?;
    let adj = Adjacency::new(graph);
    let n = adj.len();
    if n == 0 {
        return Ok(SpinglassResult {
            membership: Vec::new(),
            energy: 0.0,
        });
    }
    if !is_connected(graph) {
        return Err(Error::Disconnected {
            algorithm: "spinglass",
        });
    }

    let mut rng = build_rng(rng_seed);
    let mut progress = Progress::new(progress, "spinglass");
    let mut model = Potts::new(&adj, params.spins.min(n), params.gamma, &mut rng);

    if adj.two_m() > 0.0 {
        let steps = params.temperature_steps();
        let mut order: Vec<usize> = (0..n).collect();
        let mut t = params.start_temp;
        for step in 0..steps {
            for _ in 0..params.sweeps_per_temp {
                shuffle_nodes(&mut rng, &mut order);
                for &v in &order {
                    model.heat_bath(v, t, &mut rng);
                }
            }
            t *= params.cool_fact;
            progress.update(step + 1, steps);
        }
        model.quench();
    }
    progress.finish();

    let energy = model.energy();
    Ok(SpinglassResult {
        membership: relabel(&model.spin),
        energy,
    })
}

struct Potts<'a> {
    adj: &'a Adjacency,
    gamma: f64,
    spin: Vec<usize>,
    /// Total degree per spin state.
    spin_degree: Vec<f64>,
    /// Scratch: weight from the current vertex to each spin state.
    links: Vec<f64>,
    weights: Vec<f64>,
}

impl<'a> Potts<'a> {
    fn new(adj: &'a Adjacency, q: usize, gamma: f64, rng: &mut CommunityRng) -> Self {
        let spin: Vec<usize> = (0..adj.len()).map(|_| rng.random_range(0..q)).collect();
        let mut spin_degree = vec![0.0; q];
        for (v, &s) in spin.iter().enumerate() {
            spin_degree[s] += adj.degree[v];
        }
        Potts {
            adj,
            gamma,
            spin,
            spin_degree,
            links: vec![0.0; q],
            weights: vec![0.0; q],
        }
    }

    /// Detach `v` and fill `links`. Returns the vertex degree.
    fn detach(&mut self, v: usize) -> f64 {
        self.links.fill(0.0);
        for &u in &self.adj.neighbors[v] {
            if u != v {
                self.links[self.spin[u]] += 1.0;
            }
        }
        let k = self.adj.degree[v];
        self.spin_degree[self.spin[v]] -= k;
        k
    }

    /// Energy decrease from putting the detached `v` into state `s`.
    #[inline]
    fn affinity(&self, s: usize, k: f64) -> f64 {
        self.links[s] - self.gamma * k * self.spin_degree[s] / self.adj.two_m()
    }

    fn attach(&mut self, v: usize, s: usize, k: f64) {
        self.spin[v] = s;
        self.spin_degree[s] += k;
    }

    /// Draw a new state for `v` from the Boltzmann distribution at `t`.
    fn heat_bath(&mut self, v: usize, t: f64, rng: &mut CommunityRng) {
        let k = self.detach(v);
        let q = self.links.len();
        let top = (0..q)
            .map(|s| self.affinity(s, k))
            .fold(f64::NEG_INFINITY, f64::max);
        let mut norm = 0.0;
        for s in 0..q {
            let w = ((self.affinity(s, k) - top) / t).exp();
            self.weights[s] = w;
            norm += w;
        }

        let mut r = rng.random::<f64>() * norm;
        let mut chosen = q - 1;
        for (s, &w) in self.weights.iter().enumerate() {
            if r < w {
                chosen = s;
                break;
            }
            r -= w;
        }
        self.attach(v, chosen, k);
    }

    /// Greedy moves until no vertex can lower the energy.
    fn quench(&mut self) {
        for _ in 0..MAX_QUENCH_PASSES {
            let mut moved = false;
            for v in 0..self.spin.len() {
                let current = self.spin[v];
                let k = self.detach(v);
                let mut best = current;
                let mut best_affinity = self.affinity(current, k);
                for s in 0..self.links.len() {
                    let a = self.affinity(s, k);
                    if a > best_affinity + 1e-12 {
                        best = s;
                        best_affinity = a;
                    }
                }
                self.attach(v, best, k);
                moved |= best != current;
            }
            if !moved {
                break;
            }
        }
    }

    fn energy(&self) -> f64 {
        let two_m = self.adj.two_m();
        if two_m == 0.0 {
            return 0.0;
        }
        let mut inside = vec![0.0; self.spin_degree.len()];
        for (v, nbrs) in self.adj.neighbors.iter().enumerate() {
            for &u in nbrs {
                if self.spin[u] == self.spin[v] {
                    inside[self.spin[v]] += 0.5;
                }
            }
        }
        -inside
            .iter()
            .zip(&self.spin_degree)
            .map(|(e, k)| e - self.gamma * k * k / (2.0 * two_m))
            .sum::<f64>()
    }
}
