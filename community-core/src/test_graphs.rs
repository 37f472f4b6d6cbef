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

//! Fixture graphs for unit tests.

use crate::graph::{create, from_pairs, Graph};

/// Zachary's karate club: 34 vertices, 78 edges.
pub(crate) const KARATE_EDGES: [f64; 156] = [
    0., 1., 0., 2., 0., 3., 0., 4., 0., 5., 0., 6., 0., 7., 0., 8., 0., 10., 0., 11., 0., 12.,
    0., 13., 0., 17., 0., 19., 0., 21., 0., 31., 1., 2., 1., 3., 1., 7., 1., 13., 1., 17., 1.,
    19., 1., 21., 1., 30., 2., 3., 2., 7., 2., 8., 2., 9., 2., 13., 2., 27., 2., 28., 2., 32.,
    3., 7., 3., 12., 3., 13., 4., 6., 4., 10., 5., 6., 5., 10., 5., 16., 6., 16., 8., 30., 8.,
    32., 8., 33., 9., 33., 13., 33., 14., 32., 14., 33., 15., 32., 15., 33., 18., 32., 18., 33.,
    19., 33., 20., 32., 20., 33., 22., 32., 22., 33., 23., 25., 23., 27., 23., 29., 23., 32.,
    23., 33., 24., 25., 24., 27., 24., 31., 25., 31., 26., 29., 26., 33., 27., 33., 28., 31.,
    28., 33., 29., 32., 29., 33., 30., 32., 30., 33., 31., 32., 31., 33., 32., 33.,
];

pub(crate) fn karate() -> Graph {
    create(34, &KARATE_EDGES).unwrap()
}

/// Two triangles `{0, 1, 2}` and `{3, 4, 5}` joined by the edge `2 - 3`.
pub(crate) fn two_triangles() -> Graph {
    from_pairs(6, &[(0, 1), (1, 2), (0, 2), (2, 3), (3, 4), (4, 5), (3, 5)]).unwrap()
}

/// Path `0 - 1 - ... - (n - 1)`.
pub(crate) fn path(n: usize) -> Graph {
    let pairs: Vec<(usize, usize)> = (1..n).map(|v| (v - 1, v)).collect();
    from_pairs(n, &pairs).unwrap()
}

/// `k` disjoint cliques of `size` vertices each.
pub(crate) fn cliques(k: usize, size: usize) -> Graph {
    let mut pairs = Vec::new();
    for c in 0..k {
        let base = c * size;
        for u in 0..size {
            for v in (u + 1)..size {
                pairs.push((base + u, base + v));
            }
        }
    }
    from_pairs(k * size, &pairs).unwrap()
}

/// `k` cliques of `size` vertices joined in a ring by single edges.
pub(crate) fn ring_of_cliques(k: usize, size: usize) -> Graph {
    let mut pairs = Vec::new();
    for c in 0..k {
        let base = c * size;
        for u in 0..size {
            for v in (u + 1)..size {
                pairs.push((base + u, base + v));
            }
        }
        if k > 1 {
            let next = ((c + 1) % k) * size;
            pairs.push((base + size - 1, next));
        }
    }
    from_pairs(k * size, &pairs).unwrap()
}

#[test]
fn karate_has_78_edges() {
    let g = karate();
    assert_eq!(g.node_count(), 34);
    assert_eq!(g.edge_count(), 78);
}
