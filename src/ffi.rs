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

//! The C / WebAssembly boundary.
//!
//! Every detection entry point returns a status code (see [`Status`]) and,
//! on success, publishes its result into a slot read through the
//! `get*` accessors until the next successful run or `releaseResult`.
//! A failed run leaves the slot untouched and stores a message readable
//! with `getLastError`. All numbers crossing the boundary are `f64`.
//!
//! State is per thread: the result slot, the progress callback, the last
//! error and the registry of host buffers.

use std::cell::{Cell, RefCell};
use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::{ptr, slice};

use foldhash::HashMap;
use tracing::warn;

use crate::algorithm::AlgorithmSelector;
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result, Status};
use crate::progress::{CallbackSink, ProgressSink};
use crate::seed::SeedView;
use crate::store::ResultStore;

thread_local! {
    static STORE: RefCell<ResultStore> = const { RefCell::new(ResultStore::new()) };
    static PROGRESS: Cell<Option<CallbackSink>> = const { Cell::new(None) };
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
    /// Address and length of every live `createBuffer` allocation.
    static HOST_BUFFERS: RefCell<HashMap<usize, usize>> = RefCell::new(HashMap::default());
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = CString::new(msg.replace('\0', " ")).ok();
    });
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Run `f`, converting errors and panics into a status code.
fn guarded(f: impl FnOnce() -> Result<()>) -> i32 {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Status::Ok.into(),
        Ok(Err(err)) => {
            warn!(%err, status = ?err.status(), "community detection failed");
            set_last_error(&err.to_string());
            err.status().into()
        }
        Err(payload) => {
            let msg = format!("internal error: {}", panic_message(payload.as_ref()));
            warn!(%msg, "panic caught at the boundary");
            set_last_error(&msg);
            Status::Internal.into()
        }
    }
}

/// Longest `f64` slice `slice::from_raw_parts` accepts.
const MAX_HOST_SLICE: usize = isize::MAX as usize / std::mem::size_of::<f64>();

/// # Safety
///
/// Unless null, `data` must point to `len` readable values that stay valid
/// and unmodified for `'a`.
unsafe fn host_slice<'a>(data: *const f64, len: usize, what: &str) -> Result<&'a [f64]> {
    if len == 0 {
        return Ok(&[]);
    }
    if data.is_null() {
        return Err(Error::InvalidArgument(format!(
            "{what} pointer is null but its length is {len}"
        )));
    }
    if len > MAX_HOST_SLICE {
        return Err(Error::InvalidArgument(format!(
            "{what} length {len} exceeds the addressable maximum"
        )));
    }
    // SAFETY: non-null and `len` values long per the caller's contract.
    Ok(unsafe { slice::from_raw_parts(data, len) })
}

/// # Safety
///
/// See [`run_community_detection`]; `edges_len` counts reals.
unsafe fn run(
    selector: Result<AlgorithmSelector>,
    vertex_count: i64,
    edges: *const f64,
    edges_len: usize,
    seed: *const f64,
) -> i32 {
    guarded(|| {
        let selector = selector?;
        // SAFETY: forwarded from the entry point's contract.
        let edges = unsafe { host_slice(edges, edges_len, "edges")? };
        let seed = if seed.is_null() || !selector.is_seeded() {
            None
        } else {
            let n = usize::try_from(vertex_count)
                .map_err(|_| Error::InvalidArgument(format!("invalid vertex count {vertex_count}")))?;
            // SAFETY: a non-null seed holds `vertex_count` values.
            Some(SeedView::new(unsafe { host_slice(seed, n, "seed")? }))
        };

        let mut callback = PROGRESS.with(Cell::get);
        let sink = callback.as_mut().map(|c| c as &mut dyn ProgressSink);
        let envelope = Dispatcher::default().detect(selector, vertex_count, edges, seed, sink)?;
        STORE.with(|store| store.borrow_mut().publish(&envelope));
        LAST_ERROR.with(|cell| cell.borrow_mut().take());
        Ok(())
    })
}

/// Run the algorithm with numeric id `algorithm_id` on an undirected graph.
///
/// `edges` holds `edge_count` pairs, i.e. `2 * edge_count` reals. `seed` is
/// null or points to `vertex_count` reals, `-1` marking unconstrained
/// vertices; it is only read by the seeded algorithms.
///
/// # Safety
///
/// `edges` (and `seed` when non-null) must be valid for reads of the sizes
/// above for the duration of the call.
#[export_name = "runCommunityDetection"]
pub unsafe extern "C" fn run_community_detection(
    algorithm_id: i32,
    vertex_count: i64,
    edges: *const f64,
    edge_count: usize,
    seed: *const f64,
) -> i32 {
    let Some(edges_len) = edge_count.checked_mul(2) else {
        return guarded(|| Err(Error::InvalidArgument(format!("edge count {edge_count} overflows"))));
    };
    // SAFETY: forwarded from this function's contract.
    unsafe {
        run(
            AlgorithmSelector::try_from(algorithm_id),
            vertex_count,
            edges,
            edges_len,
            seed,
        )
    }
}

macro_rules! entry_points {
    ($($name:ident => $export:literal, $selector:ident;)*) => {$(
        #[doc = concat!("Run `", $export, "`; `edges_len` counts reals.")]
        ///
        /// # Safety
        ///
        /// `edges` must be valid for reads of `edges_len` values.
        #[export_name = $export]
        pub unsafe extern "C" fn $name(vertex_count: i64, edges: *const f64, edges_len: usize) -> i32 {
            // SAFETY: forwarded from this function's contract.
            unsafe {
                run(Ok(AlgorithmSelector::$selector), vertex_count, edges, edges_len, ptr::null())
            }
        }
    )*};
}

macro_rules! seeded_entry_points {
    ($($name:ident => $export:literal, $selector:ident;)*) => {$(
        #[doc = concat!("Run `", $export, "` with a seed membership; `edges_len` counts reals.")]
        ///
        /// # Safety
        ///
        /// `edges` must be valid for reads of `edges_len` values and `seed`,
        /// unless null, for reads of `vertex_count` values.
        #[export_name = $export]
        pub unsafe extern "C" fn $name(
            vertex_count: i64,
            edges: *const f64,
            edges_len: usize,
            seed: *const f64,
        ) -> i32 {
            // SAFETY: forwarded from this function's contract.
            unsafe { run(Ok(AlgorithmSelector::$selector), vertex_count, edges, edges_len, seed) }
        }
    )*};
}

entry_points! {
    edge_betweenness => "edgeBetweenness", EdgeBetweenness;
    fast_greedy => "fastGreedy", FastGreedy;
    infomap => "infomap", Infomap;
    label_propagation => "labelPropagation", LabelPropagation;
    leading_eigenvector => "leadingEigenvector", LeadingEigenvector;
    louvain => "louvain", Louvain;
    leiden => "leiden", Leiden;
    optimal => "optimal", Optimal;
    spinglass => "spinglass", Spinglass;
    walktrap => "walktrap", Walktrap;
}

seeded_entry_points! {
    fast_greedy_seed => "fastGreedySeed", FastGreedySeed;
    louvain_seed => "louvainSeed", LouvainSeed;
    edge_betweenness_seed => "edgeBetweennessSeed", EdgeBetweennessSeed;
}

// ===== Result accessors =====

/// Address of the published membership, null when nothing is published.
#[export_name = "getMembershipAddress"]
pub extern "C" fn get_membership_address() -> *const f64 {
    STORE.with(|store| store.borrow().membership_address())
}

#[export_name = "getMembershipLength"]
pub extern "C" fn get_membership_length() -> usize {
    STORE.with(|store| store.borrow().membership_length())
}

#[export_name = "getModularityTraceAddress"]
pub extern "C" fn get_modularity_trace_address() -> *const f64 {
    STORE.with(|store| store.borrow().modularity_trace_address())
}

#[export_name = "getModularityTraceLength"]
pub extern "C" fn get_modularity_trace_length() -> usize {
    STORE.with(|store| store.borrow().modularity_trace_length())
}

/// Best modularity of the published result, NaN when nothing is published.
#[export_name = "getBestModularity"]
pub extern "C" fn get_best_modularity() -> f64 {
    STORE.with(|store| store.borrow().best_modularity())
}

/// Free the published result. Calling it again is harmless.
#[export_name = "releaseResult"]
pub extern "C" fn release_result() {
    STORE.with(|store| store.borrow_mut().release());
}

#[export_name = "getMembershipPointer"]
pub extern "C" fn get_membership_pointer() -> *const f64 {
    get_membership_address()
}

#[export_name = "getModularityPointer"]
pub extern "C" fn get_modularity_pointer() -> *const f64 {
    get_modularity_trace_address()
}

#[export_name = "getModularitySize"]
pub extern "C" fn get_modularity_size() -> usize {
    get_modularity_trace_length()
}

#[export_name = "freeResult"]
pub extern "C" fn free_result() {
    release_result();
}

// ===== Progress =====

/// Register the progress callback; null clears it. The callback receives
/// percentages in `[0, 100]` synchronously from inside the algorithm.
#[export_name = "setProgressCallback"]
pub extern "C" fn set_progress_callback(callback: Option<extern "C" fn(f64)>) {
    PROGRESS.with(|cell| cell.set(callback.map(CallbackSink)));
}

// ===== Host buffers =====

/// Allocate `len` zeroed reals for the host to fill, e.g. with an edge
/// list. Returns null for `len == 0`. Free with `destroyBuffer`.
#[export_name = "createBuffer"]
pub extern "C" fn create_buffer(len: usize) -> *mut f64 {
    if len == 0 {
        return ptr::null_mut();
    }
    let data = Box::into_raw(vec![0.0_f64; len].into_boxed_slice()) as *mut f64;
    HOST_BUFFERS.with(|buffers| buffers.borrow_mut().insert(data as usize, len));
    data
}

/// Free a buffer from `createBuffer`. Null and unknown addresses are
/// ignored.
#[export_name = "destroyBuffer"]
pub extern "C" fn destroy_buffer(data: *mut f64) {
    if data.is_null() {
        return;
    }
    match HOST_BUFFERS.with(|buffers| buffers.borrow_mut().remove(&(data as usize))) {
        // SAFETY: the registry only holds live allocations from `create_buffer`.
        Some(len) => drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(data, len)) }),
        None => warn!(address = data as usize, "destroyBuffer on an unknown address"),
    }
}

// ===== Errors =====

/// Message of the last failed call on this thread, or null.
///
/// Valid until the next call into this library on the same thread. Must
/// not be freed by the caller.
#[export_name = "getLastError"]
pub extern "C" fn get_last_error() -> *const c_char {
    LAST_ERROR.with(|cell| cell.borrow().as_ref().map_or(ptr::null(), |s| s.as_ptr()))
}

#[export_name = "clearLastError"]
pub extern "C" fn clear_last_error() {
    LAST_ERROR.with(|cell| cell.borrow_mut().take());
}
