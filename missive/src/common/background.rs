/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio_util::task::TaskTracker;
use tracing::{debug, trace};

use crate::common::config::MissiveConfig;
use crate::message::MissiveError;

/// Runs background deliveries on a Tokio blocking pool.
///
/// A distributor created inside a Tokio runtime uses that runtime. Otherwise
/// the dispatcher builds its own multi-threaded runtime on first use. Every
/// job is tracked so callers can wait for outstanding deliveries.
pub(crate) struct BackgroundDispatcher {
    ambient: Option<Handle>,
    owned: Mutex<Option<Runtime>>,
    tracker: TaskTracker,
    waiters: tokio::sync::Mutex<()>,
    worker_threads: usize,
    thread_name: String,
}

impl BackgroundDispatcher {
    pub(crate) fn new(config: &MissiveConfig) -> Self {
        Self {
            ambient: Handle::try_current().ok(),
            owned: Mutex::new(None),
            tracker: TaskTracker::new(),
            waiters: tokio::sync::Mutex::new(()),
            worker_threads: config.worker_threads(),
            thread_name: config.background.thread_name.clone(),
        }
    }

    fn handle(&self) -> Result<Handle, MissiveError> {
        if let Some(handle) = &self.ambient {
            return Ok(handle.clone());
        }
        let mut owned = self.owned.lock();
        if let Some(runtime) = owned.as_ref() {
            return Ok(runtime.handle().clone());
        }
        debug!(worker_threads = self.worker_threads, "starting background delivery runtime");
        let runtime = Builder::new_multi_thread()
            .worker_threads(self.worker_threads)
            .thread_name(self.thread_name.clone())
            .enable_all()
            .build()
            .map_err(MissiveError::Background)?;
        let handle = runtime.handle().clone();
        *owned = Some(runtime);
        Ok(handle)
    }

    /// Schedules `job` on the blocking pool.
    pub(crate) fn spawn<F>(&self, job: F) -> Result<(), MissiveError>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = self.handle()?;
        self.tracker.spawn_blocking_on(job, &handle);
        trace!(outstanding = self.tracker.len(), "background delivery scheduled");
        Ok(())
    }

    /// Resolves once every job scheduled so far has finished.
    ///
    /// Waiters take turns: the tracker is closed for the duration of one
    /// wait and reopened before the next waiter closes it again.
    pub(crate) async fn wait(&self) {
        let _turn = self.waiters.lock().await;
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.tracker.len()
    }
}

impl Drop for BackgroundDispatcher {
    fn drop(&mut self) {
        if let Some(runtime) = self.owned.get_mut().take() {
            runtime.shutdown_background();
        }
    }
}
