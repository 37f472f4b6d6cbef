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

//! Owned result buffers behind the boundary accessors.

use std::ptr;

use crate::envelope::ResultEnvelope;

/// Length-tagged buffer of `f64` values owned by the store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultBuffer {
    data: Box<[f64]>,
}

impl ResultBuffer {
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Address of the first value, null for an empty buffer.
    pub fn as_ptr(&self) -> *const f64 {
        if self.data.is_empty() {
            ptr::null()
        } else {
            self.data.as_ptr()
        }
    }
}

impl FromIterator<f64> for ResultBuffer {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        ResultBuffer {
            data: iter.into_iter().collect(),
        }
    }
}

/// The published form of one envelope.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultHandle {
    pub membership: ResultBuffer,
    pub modularity_trace: ResultBuffer,
    pub best_modularity: f64,
}

impl From<&ResultEnvelope> for ResultHandle {
    fn from(envelope: &ResultEnvelope) -> Self {
        ResultHandle {
            membership: envelope.membership.iter().map(|&c| c as f64).collect(),
            modularity_trace: envelope.modularity_trace.iter().copied().collect(),
            best_modularity: envelope.best_modularity,
        }
    }
}

/// Holds at most one published result.
///
/// Publishing drops the previous handle. Reads with nothing published
/// answer a null address, a zero length and NaN.
#[derive(Debug, Default)]
pub struct ResultStore {
    slot: Option<ResultHandle>,
}

impl ResultStore {
    pub const fn new() -> Self {
        ResultStore { slot: None }
    }

    pub fn publish(&mut self, envelope: &ResultEnvelope) {
        self.slot = Some(ResultHandle::from(envelope));
    }

    /// Drop the current result, if any. Idempotent.
    pub fn release(&mut self) {
        self.slot = None;
    }

    pub fn current(&self) -> Option<&ResultHandle> {
        self.slot.as_ref()
    }

    pub fn membership_address(&self) -> *const f64 {
        self.slot.as_ref().map_or(ptr::null(), |h| h.membership.as_ptr())
    }

    pub fn membership_length(&self) -> usize {
        self.slot.as_ref().map_or(0, |h| h.membership.len())
    }

    pub fn modularity_trace_address(&self) -> *const f64 {
        self.slot
            .as_ref()
            .map_or(ptr::null(), |h| h.modularity_trace.as_ptr())
    }

    pub fn modularity_trace_length(&self) -> usize {
        self.slot.as_ref().map_or(0, |h| h.modularity_trace.len())
    }

    pub fn best_modularity(&self) -> f64 {
        self.slot.as_ref().map_or(f64::NAN, |h| h.best_modularity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_answers_null() {
        let store = ResultStore::new();
        assert!(store.membership_address().is_null());
        assert!(store.modularity_trace_address().is_null());
        assert_eq!(store.membership_length(), 0);
        assert_eq!(store.modularity_trace_length(), 0);
        assert!(store.best_modularity().is_nan());
    }

    #[test]
    fn publish_copies_and_release_clears() {
        let mut store = ResultStore::new();
        store.publish(&ResultEnvelope::new(vec![0, 1, 1], vec![0.0, 0.25]));
        let handle = store.current().unwrap();
        assert_eq!(handle.membership.as_slice(), &[0.0, 1.0, 1.0]);
        assert_eq!(store.modularity_trace_length(), 2);
        assert_eq!(store.best_modularity(), 0.25);
        assert!(!store.membership_address().is_null());

        store.release();
        store.release();
        assert!(store.current().is_none());
        assert!(store.membership_address().is_null());
    }

    #[test]
    fn publish_replaces_previous_result() {
        let mut store = ResultStore::new();
        store.publish(&ResultEnvelope::new(vec![0, 0], vec![0.0]));
        store.publish(&ResultEnvelope::new(vec![0, 1, 2], vec![0.5]));
        assert_eq!(store.membership_length(), 3);
        assert_eq!(store.best_modularity(), 0.5);
    }
}
