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

//! Progress notifications emitted by long-running algorithms.

/// Receives `(stage, percent)` notifications from inside an algorithm.
///
/// Called synchronously on the algorithm's own stack. Implementations must
/// not panic and should return quickly; there is no way to cancel the
/// running algorithm from here.
pub trait ProgressHandler {
    fn on_progress(&mut self, stage: &str, percent: f64);
}

/// Handler that discards every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressHandler for NoProgress {
    #[inline]
    fn on_progress(&mut self, _stage: &str, _percent: f64) {}
}

/// Reports at most once per whole percent.
pub(crate) struct Progress<'a> {
    handler: &'a mut dyn ProgressHandler,
    stage: &'static str,
    last: Option<u32>,
}

impl<'a> Progress<'a> {
    pub fn new(handler: &'a mut dyn ProgressHandler, stage: &'static str) -> Self {
        Progress {
            handler,
            stage,
            last: None,
        }
    }

    /// Report `done` out of `total` units of work.
    pub fn update(&mut self, done: usize, total: usize) {
        let percent = if total == 0 {
            100.0
        } else {
            (done.min(total) as f64 * 100.0) / total as f64
        };
        let whole = percent.floor() as u32;
        if self.last != Some(whole) {
            self.last = Some(whole);
            self.handler.on_progress(self.stage, percent);
        }
    }

    pub fn finish(&mut self) {
        if self.last != Some(100) {
            self.last = Some(100);
            self.handler.on_progress(self.stage, 100.0);
        }
    }
}
