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

//! Forwarding library progress to the host.

use community_core::ProgressHandler;

/// A sink refused a progress update. The relay logs it and carries on.
#[derive(Debug, thiserror::Error)]
#[error("progress sink failed: {0}")]
pub struct SinkError(pub String);

/// Receives percentages in `[0, 100]`.
pub trait ProgressSink {
    fn report(&mut self, percent: f64) -> Result<(), SinkError>;
}

impl<F: FnMut(f64)> ProgressSink for F {
    fn report(&mut self, percent: f64) -> Result<(), SinkError> {
        self(percent);
        Ok(())
    }
}

/// Host callback registered through `setProgressCallback`.
#[derive(Clone, Copy, Debug)]
pub struct CallbackSink(pub extern "C" fn(f64));

impl ProgressSink for CallbackSink {
    fn report(&mut self, percent: f64) -> Result<(), SinkError> {
        (self.0)(percent);
        Ok(())
    }
}

/// Adapts a [`ProgressSink`] to the library's handler.
///
/// Only the percentage is forwarded. Non-finite values are dropped and
/// the rest are clamped to `[0, 100]`.
pub struct ProgressRelay<'a> {
    sink: Option<&'a mut dyn ProgressSink>,
}

impl<'a> ProgressRelay<'a> {
    pub fn new(sink: Option<&'a mut dyn ProgressSink>) -> Self {
        ProgressRelay { sink }
    }
}

impl ProgressHandler for ProgressRelay<'_> {
    fn on_progress(&mut self, stage: &str, percent: f64) {
        let Some(sink) = self.sink.as_deref_mut() else {
            return;
        };
        if !percent.is_finite() {
            return;
        }
        let percent = percent.clamp(0.0, 100.0);
        tracing::trace!(stage, percent, "progress");
        if let Err(err) = sink.report(percent) {
            tracing::warn!(stage, %err, "dropping progress update");
        }
    }
}
