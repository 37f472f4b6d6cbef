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

use super::HierarchicalResult;
use crate::agglomeration::{starting_partition, Agglomeration};
use crate::error::Result;
use crate::graph::{Adjacency, Graph};
use crate::progress::{Progress, ProgressHandler};
use crate::seed::SeedConstraint;

/// Greedy modularity optimization (Clauset, Newman and Moore).
///
/// Starts from singletons, or from the seed groups when `seed` is given,
/// and repeatedly merges the pair of adjacent communities with the largest
/// modularity gain until no adjacent pair is left. Merges are recorded even
/// when they lower modularity, so the trace covers the whole hierarchy; the
/// returned membership is the cut at the first modularity maximum.
///
/// With a seed, communities carrying different seed ids are never merged.
///
/// # Example
/// ```rust
/// use community_core::{graph, community, NoProgress};
///
/// let g = graph::create(3, &[0., 1., 1., 2.]).unwrap();
/// let result = community::fast_greedy(&g, None, &mut NoProgress).unwrap();
/// assert_eq!(result.modularity, vec![-0.375, -0.125, 0.0]);
/// assert_eq!(result.membership, vec![0, 0, 0]);
/// ```
pub fn fast_greedy(
    graph: &Graph,
    seed: Option<&SeedConstraint>,
    progress: &mut dyn ProgressHandler,
) -> Result<HierarchicalResult> {
    let adj = Adjacency::new(graph);
    let (initial, labels) = starting_partition(seed, adj.len())?;
    let mut agg = Agglomeration::new(&adj, &initial, &labels);
    let mut progress = Progress::new(progress, "fast greedy");
    let total = agg.leaf_count().saturating_sub(1);

    while let Some((a, b)) = agg.best_connected_pair() {
        agg.merge(a, b);
        progress.update(agg.merge_count(), total);
    }
    progress.finish();
    agg.into_result(initial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modularity::modularity;
    use crate::progress::tests::Recorder;
    use crate::progress::NoProgress;
    use crate::test_graphs;

    #[test]
    fn test_path_trace() {
        let g = test_graphs::path(3);
        let r = fast_greedy(&g, None, &mut NoProgress).unwrap();
        assert_eq!(r.modularity.len(), 3);
        assert!((r.modularity[0] + 0.375).abs() < 1e-12);
        assert!((r.modularity[2]).abs() < 1e-12);
        assert_eq!(r.membership, vec![0, 0, 0]);
        assert_eq!(r.dendrogram.merges(), &[[0, 1], [2, 3]]);
    }

    #[test]
    fn test_two_triangles() {
        let g = test_graphs::two_triangles();
        let r = fast_greedy(&g, None, &mut NoProgress).unwrap();
        assert_eq!(r.membership, vec![0, 0, 0, 1, 1, 1]);
        let best = r.modularity.iter().cloned().fold(f64::MIN, f64::max);
        assert!((best - 5.0 / 14.0).abs() < 1e-12);
    }

    #[test]
    fn test_karate_quality() {
        let g = test_graphs::karate();
        let r = fast_greedy(&g, None, &mut NoProgress).unwrap();
        let best = r.modularity.iter().cloned().fold(f64::MIN, f64::max);
        assert!(best > 0.35 && best < 0.45, "best = {best}");
        let q = modularity(&g, &r.membership).unwrap();
        assert!((q - best).abs() < 1e-9);
        assert_eq!(r.dendrogram.len(), 33);
    }

    #[test]
    fn test_disconnected_stops_early() {
        let g = test_graphs::cliques(3, 4);
        let r = fast_greedy(&g, None, &mut NoProgress).unwrap();
        assert_eq!(r.dendrogram.len(), 9);
        assert_eq!(
            r.membership,
            vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2]
        );
    }

    #[test]
    fn test_seed_constraint() {
        let g = test_graphs::karate();
        let mut seeds = vec![None; 34];
        seeds[0] = Some(1);
        seeds[4] = Some(1);
        seeds[31] = Some(0);
        seeds[33] = Some(0);
        let seed = SeedConstraint::new(seeds);
        let r = fast_greedy(&g, Some(&seed), &mut NoProgress).unwrap();
        let m = &r.membership;
        assert_eq!(m[0], m[4]);
        assert_eq!(m[31], m[33]);
        assert_ne!(m[0], m[33]);
        assert_eq!(r.dendrogram.leaf_count(), 32);
    }

    #[test]
    fn test_seed_length_checked() {
        let g = test_graphs::path(3);
        let seed = SeedConstraint::new(vec![None; 2]);
        assert!(fast_greedy(&g, Some(&seed), &mut NoProgress).is_err());
    }

    #[test]
    fn test_reports_progress() {
        let g = test_graphs::karate();
        let mut recorder = Recorder::default();
        fast_greedy(&g, None, &mut recorder).unwrap();
        assert!(!recorder.0.is_empty());
        assert_eq!(recorder.0.last().map(|(_, p)| *p), Some(100.0));
        assert!(recorder.0.iter().all(|(_, p)| (0.0..=100.0).contains(p)));
    }
}
