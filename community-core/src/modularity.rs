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

use crate::common::{community_count, relabel};
use crate::error::{Error, Result};
use crate::graph::{edge_pairs, Graph};

/// Newman modularity of `membership` on `graph`.
///
/// `Q = sum_c [ L_c / m - (K_c / 2m)^2 ]` where `L_c` is the number of edges
/// inside community `c` and `K_c` the sum of its degrees. A self-loop counts
/// once in `L_c` and twice in `K_c`. Graphs without edges have modularity
/// `0.0`. Community ids may be arbitrary non-negative integers.
pub fn modularity(graph: &Graph, membership: &[usize]) -> Result<f64> {
    let n = graph.node_count();
    if membership.len() != n {
        return Err(Error::LengthMismatch {
            what: "membership",
            expected: n,
            found: membership.len(),
        });
    }
    let m = graph.edge_count() as f64;
    if m == 0.0 {
        return Ok(0.0);
    }

    let labels = relabel(membership);
    let k = community_count(&labels);
    let mut internal = vec![0.0; k];
    let mut degree = vec![0.0; k];
    for (u, v) in edge_pairs(graph) {
        let (cu, cv) = (labels[u], labels[v]);
        degree[cu] += 1.0;
        degree[cv] += 1.0;
        if cu == cv {
            internal[cu] += 1.0;
        }
    }

    let two_m = 2.0 * m;
    let q = internal
        .iter()
        .zip(&degree)
        .map(|(l, d)| l / m - (d / two_m).powi(2))
        .sum();
    Ok(q)
}

/// Index of the first maximum, ignoring NaN entries.
///
/// Returns `None` for an empty or all-NaN slice.
pub fn which_max(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if value <= b => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::from_pairs;
    use crate::test_graphs;

    #[test]
    fn two_triangles_split() {
        let g = test_graphs::two_triangles();
        let q = modularity(&g, &[0, 0, 0, 1, 1, 1]).unwrap();
        assert!((q - 5.0 / 14.0).abs() < 1e-12);
    }

    #[test]
    fn single_community_is_zero() {
        let g = test_graphs::karate();
        let q = modularity(&g, &[0; 34]).unwrap();
        assert!(q.abs() < 1e-12);
    }

    #[test]
    fn path_singletons() {
        let g = test_graphs::path(3);
        let q = modularity(&g, &[0, 1, 2]).unwrap();
        assert!((q + 0.375).abs() < 1e-12);
    }

    #[test]
    fn arbitrary_ids_are_accepted() {
        let g = test_graphs::two_triangles();
        let a = modularity(&g, &[0, 0, 0, 1, 1, 1]).unwrap();
        let b = modularity(&g, &[9, 9, 9, 4, 4, 4]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn self_loop_counts_once_inside() {
        let g = from_pairs(2, &[(0, 0), (0, 1)]).unwrap();
        // m = 2, K_0 = 3, K_1 = 1
        let q = modularity(&g, &[0, 1]).unwrap();
        let expected = 1.0 / 2.0 - (3.0f64 / 4.0).powi(2) - (1.0f64 / 4.0).powi(2);
        assert!((q - expected).abs() < 1e-12);
    }

    #[test]
    fn edgeless_graph_is_zero() {
        let g = from_pairs(3, &[]).unwrap();
        assert_eq!(modularity(&g, &[0, 1, 2]).unwrap(), 0.0);
    }

    #[test]
    fn length_is_checked() {
        let g = test_graphs::path(3);
        assert!(matches!(
            modularity(&g, &[0, 1]),
            Err(Error::LengthMismatch { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn which_max_prefers_first() {
        assert_eq!(which_max(&[0.1, 0.3, 0.3, 0.2]), Some(1));
        assert_eq!(which_max(&[f64::NAN, -1.0, f64::NAN]), Some(1));
        assert_eq!(which_max(&[]), None);
        assert_eq!(which_max(&[f64::NAN]), None);
    }
}
