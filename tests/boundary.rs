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

//! Drives the exported C functions the way a host would.

mod common;

use std::cell::RefCell;
use std::ffi::CStr;
use std::ptr;
use std::slice;

use community_detection::ffi::*;
use common::{is_canonical, KARATE_EDGES, KARATE_VERTICES, PATH_3, TWO_TRIANGLES};

fn membership() -> Vec<usize> {
    let len = get_membership_length();
    if len == 0 {
        return Vec::new();
    }
    unsafe { slice::from_raw_parts(get_membership_address(), len) }
        .iter()
        .map(|&c| c as usize)
        .collect()
}

fn trace() -> Vec<f64> {
    let len = get_modularity_trace_length();
    if len == 0 {
        return Vec::new();
    }
    unsafe { slice::from_raw_parts(get_modularity_trace_address(), len) }.to_vec()
}

fn last_error() -> Option<String> {
    let msg = get_last_error();
    (!msg.is_null()).then(|| unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned())
}

fn run(algorithm_id: i32, vertex_count: i64, edges: &[f64], seed: Option<&[f64]>) -> i32 {
    unsafe {
        run_community_detection(
            algorithm_id,
            vertex_count,
            edges.as_ptr(),
            edges.len() / 2,
            seed.map_or(ptr::null(), <[f64]>::as_ptr),
        )
    }
}

#[test]
fn fast_greedy_on_a_path() {
    assert_eq!(run(1, 3, &PATH_3, None), 0);
    assert_eq!(membership().len(), 3);
    let t = trace();
    assert_eq!(t.len(), 3);
    assert!((t[0] + 0.375).abs() < 1e-12);
    assert!((t[1] + 0.125).abs() < 1e-12);
    assert!(t[2].abs() < 1e-12);
    assert!(get_best_modularity().abs() < 1e-12);
    release_result();
}

#[test]
fn louvain_on_the_karate_club() {
    assert_eq!(run(5, KARATE_VERTICES, &KARATE_EDGES, None), 0);
    let best = get_best_modularity();
    assert!((0.35..=0.45).contains(&best), "best = {best}");
    assert_eq!(Some(best), trace().into_iter().reduce(f64::max));
    assert!(is_canonical(&membership()));
    release_result();
}

#[test]
fn release_is_idempotent() {
    assert_eq!(run(1, 6, &TWO_TRIANGLES, None), 0);
    release_result();
    release_result();
    assert!(get_membership_address().is_null());
    assert!(get_modularity_trace_address().is_null());
    assert_eq!(get_membership_length(), 0);
    assert_eq!(get_modularity_trace_length(), 0);
    assert!(get_best_modularity().is_nan());
}

#[test]
fn accessors_before_any_run() {
    assert!(get_membership_address().is_null());
    assert_eq!(get_modularity_size(), 0);
    assert!(get_best_modularity().is_nan());
}

#[test]
fn failures_leave_the_previous_result_readable() {
    assert_eq!(run(1, 6, &TWO_TRIANGLES, None), 0);
    let before = membership();
    let address = get_membership_address();

    // seeded selector without a seed
    assert_eq!(run(9, 6, &TWO_TRIANGLES, None), 2);
    assert!(last_error().unwrap().contains("requires a seed"));
    // unknown selector
    assert_eq!(run(42, 6, &TWO_TRIANGLES, None), 1);
    assert_eq!(last_error().unwrap(), "unsupported algorithm `42`");
    // endpoint out of range
    assert_eq!(run(1, 2, &TWO_TRIANGLES, None), 2);
    // spinglass refuses a disconnected graph
    assert_eq!(run(7, 4, &[0., 1., 2., 3.], None), 3);
    assert!(last_error().unwrap().contains("connected"));

    assert_eq!(get_membership_address(), address);
    assert_eq!(membership(), before);
    release_result();
}

#[test]
fn optimal_on_the_karate_club_bounds_every_heuristic() {
    assert_eq!(run(6, KARATE_VERTICES, &KARATE_EDGES, None), 0);
    let optimum = get_best_modularity();
    assert!((optimum - 0.4198).abs() < 1e-4, "optimum = {optimum}");
    assert_eq!(trace().len(), 1);
    assert_eq!(membership().len(), 34);

    for id in [0, 1, 2, 3, 4, 5, 8, 12] {
        assert_eq!(run(id, KARATE_VERTICES, &KARATE_EDGES, None), 0);
        assert!(get_best_modularity() <= optimum + 1e-9, "algorithm {id}");
    }
    release_result();
}

#[test]
fn success_clears_the_last_error() {
    assert_eq!(run(-1, 6, &TWO_TRIANGLES, None), 1);
    assert!(last_error().is_some());
    assert_eq!(run(3, 6, &TWO_TRIANGLES, None), 0);
    assert!(last_error().is_none());
    release_result();
}

#[test]
fn every_named_entry_point_runs() {
    type Entry = unsafe extern "C" fn(i64, *const f64, usize) -> i32;
    let entries: [(&str, Entry); 9] = [
        ("edgeBetweenness", edge_betweenness),
        ("fastGreedy", fast_greedy),
        ("infomap", infomap),
        ("labelPropagation", label_propagation),
        ("leadingEigenvector", leading_eigenvector),
        ("louvain", louvain),
        ("leiden", leiden),
        ("spinglass", spinglass),
        ("walktrap", walktrap),
    ];
    for (name, entry) in entries {
        let status = unsafe { entry(KARATE_VERTICES, KARATE_EDGES.as_ptr(), KARATE_EDGES.len()) };
        assert_eq!(status, 0, "{name}: {:?}", last_error());
        let m = membership();
        assert_eq!(m.len(), 34, "{name}");
        assert!(is_canonical(&m), "{name}");
        assert!(get_modularity_trace_length() >= 1, "{name}");
        assert_eq!(Some(get_best_modularity()), trace().into_iter().reduce(f64::max));
    }

    let status = unsafe { optimal(6, TWO_TRIANGLES.as_ptr(), TWO_TRIANGLES.len()) };
    assert_eq!(status, 0);
    assert_eq!(membership(), vec![0, 0, 0, 1, 1, 1]);
    assert!((get_best_modularity() - 5.0 / 14.0).abs() < 1e-12);
    free_result();
}

#[test]
fn seeded_entry_points_respect_the_seed() {
    type Entry = unsafe extern "C" fn(i64, *const f64, usize, *const f64) -> i32;
    let entries: [(&str, Entry); 3] = [
        ("fastGreedySeed", fast_greedy_seed),
        ("louvainSeed", louvain_seed),
        ("edgeBetweennessSeed", edge_betweenness_seed),
    ];
    let mut seed = vec![-1.0; 34];
    seed[0] = 1.0;
    seed[4] = 1.0;
    seed[31] = 0.0;
    seed[33] = 0.0;
    for (name, entry) in entries {
        let status = unsafe {
            entry(
                KARATE_VERTICES,
                KARATE_EDGES.as_ptr(),
                KARATE_EDGES.len(),
                seed.as_ptr(),
            )
        };
        assert_eq!(status, 0, "{name}: {:?}", last_error());
        let m = membership();
        assert_eq!(m[0], m[4], "{name}");
        assert_eq!(m[31], m[33], "{name}");
        assert_ne!(m[0], m[33], "{name}");

        let status = unsafe { entry(KARATE_VERTICES, KARATE_EDGES.as_ptr(), KARATE_EDGES.len(), ptr::null()) };
        assert_eq!(status, 2, "{name}");
    }
    release_result();
}

thread_local! {
    static SEEN: RefCell<Vec<f64>> = const { RefCell::new(Vec::new()) };
}

extern "C" fn record(percent: f64) {
    SEEN.with(|seen| seen.borrow_mut().push(percent));
}

#[test]
fn progress_reaches_the_callback() {
    set_progress_callback(Some(record));
    assert_eq!(run(8, KARATE_VERTICES, &KARATE_EDGES, None), 0);
    set_progress_callback(None);
    assert_eq!(run(8, KARATE_VERTICES, &KARATE_EDGES, None), 0);

    let seen = SEEN.with(|seen| seen.borrow().clone());
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|p| (0.0..=100.0).contains(p)));
    assert_eq!(seen.last(), Some(&100.0));
    // nothing recorded once the callback is cleared
    assert_eq!(seen.iter().filter(|&&p| p == 100.0).count(), 1);
    release_result();
}

#[test]
fn host_buffers_carry_the_edge_list() {
    let edges = create_buffer(TWO_TRIANGLES.len());
    unsafe { ptr::copy_nonoverlapping(TWO_TRIANGLES.as_ptr(), edges, TWO_TRIANGLES.len()) };
    let status = unsafe { fast_greedy(6, edges, TWO_TRIANGLES.len()) };
    destroy_buffer(edges);
    assert_eq!(status, 0);
    assert_eq!(membership(), vec![0, 0, 0, 1, 1, 1]);
    release_result();
}

#[test]
fn original_names_alias_the_accessors() {
    assert_eq!(run(0, 6, &TWO_TRIANGLES, None), 0);
    assert_eq!(get_membership_pointer(), get_membership_address());
    assert_eq!(get_modularity_pointer(), get_modularity_trace_address());
    assert_eq!(get_modularity_size(), get_modularity_trace_length());
    free_result();
    assert!(get_membership_pointer().is_null());
}

#[test]
fn empty_graph_publishes_empty_buffers() {
    assert_eq!(run(1, 0, &[], None), 0);
    assert_eq!(get_membership_length(), 0);
    assert!(get_membership_address().is_null());
    release_result();
}
