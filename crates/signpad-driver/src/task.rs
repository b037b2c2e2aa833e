//! Owned background task handle.

use tokio::task::JoinHandle;
use tracing::trace;

/// A spawned task that is aborted when its handle is dropped.
#[derive(Debug)]
pub struct BackgroundTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    pub fn spawn<F>(name: &'static str, future: F) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        Self {
            name,
            handle: tokio::spawn(future),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abort the task. Equivalent to dropping the handle.
    pub fn stop(self) {}
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            trace!(task = self.name, "aborting background task");
        }
        self.handle.abort();
    }
}
