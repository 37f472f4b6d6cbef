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

// Reference: Raghavan et al. (2007)
// "Near linear time algorithm to detect community structures in large-scale networks"
// https://arxiv.org/abs/0709.2938

use crate::common::{build_rng, choose_random, relabel, shuffle_nodes};
use crate::error::Result;
use crate::graph::{Adjacency, Graph};
use crate::progress::{Progress, ProgressHandler};

/// Asynchronous label propagation.
///
/// Every vertex starts with its own label. Sweeps visit vertices in random
/// order and give each one the label most frequent among its neighbors,
/// counting parallel edges once per edge. A vertex keeps its label when that
/// label is among the most frequent ones; otherwise ties are broken at
/// random. Stops after a sweep without changes or after `max_sweeps`.
pub fn label_propagation(
    graph: &Graph,
    max_sweeps: usize,
    rng_seed: u64,
    progress: &mut dyn ProgressHandler,
) -> Result<Vec<usize>> {
    let adj = Adjacency::new(graph);
    let n = adj.len();
    let mut rng = build_rng(rng_seed);
    let mut progress = Progress::new(progress, "label propagation");

    let mut labels: Vec<usize> = (0..n).collect();
    let mut nodes: Vec<usize> = (0..n).collect();
    let mut label_counts: Vec<f64> = vec![0.0; n];
    let mut touched: Vec<usize> = Vec::with_capacity(64);
    let mut best_labels: Vec<usize> = Vec::with_capacity(8);

    for sweep in 0..max_sweeps {
        let mut changed = false;
        shuffle_nodes(&mut rng, &mut nodes);

        for &node in &nodes {
            if adj.neighbors[node].is_empty() {
                continue;
            }
            touched.clear();
            for &nbr in &adj.neighbors[node] {
                let lab = labels[nbr];
                if label_counts[lab] == 0.0 {
                    touched.push(lab);
                }
                label_counts[lab] += 1.0;
            }

            let mut max_freq = f64::NEG_INFINITY;
            let mut current_is_best = false;
            best_labels.clear();
            for &lab in &touched {
                let val = label_counts[lab];
                if val > max_freq {
                    max_freq = val;
                    best_labels.clear();
                    best_labels.push(lab);
                    current_is_best = lab == labels[node];
                } else if val == max_freq {
                    best_labels.push(lab);
                    current_is_best |= lab == labels[node];
                }
            }
            for &lab in &touched {
                label_counts[lab] = 0.0;
            }

            if !best_labels.is_empty() && !current_is_best {
                labels[node] = choose_random(&mut rng, &best_labels);
                changed = true;
            }
        }

        progress.update(sweep + 1, max_sweeps);
        if !changed {
            break;
        }
    }
    progress.finish();
    Ok(relabel(&labels))
}
