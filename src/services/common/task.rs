use std::future::Future;

use tokio::task::JoinHandle;

/// Handle to a spawned timer or deferred action.
///
/// Dropping the handle aborts the task. `cancel` is idempotent.
#[derive(Debug)]
pub struct TaskHandle {
    inner: Option<JoinHandle<()>>,
}

impl TaskHandle {
    /// Spawn `future` on the current runtime.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            inner: Some(tokio::spawn(future)),
        }
    }

    /// Abort the task if it is still running.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.inner.take() {
            handle.abort();
        }
    }

    /// Release the task so it runs to completion even if this handle's
    /// owner is replaced.
    pub fn detach(mut self) {
        self.inner.take();
    }

    /// Whether the task is still scheduled or running.
    pub fn is_active(&self) -> bool {
        self.inner.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Cancel and clear an optional handle slot.
pub(crate) fn cancel_slot(slot: &mut Option<TaskHandle>) {
    if let Some(mut handle) = slot.take() {
        handle.cancel();
    }
}
