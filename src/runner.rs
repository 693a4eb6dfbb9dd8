//! Background execution of one agent run.
//!
//! The run is spawned as an independent tokio task so the stream bridge can
//! drain progress events concurrently. Two guarantees live here:
//!
//! - the end-of-stream sentinel is enqueued exactly once, whatever the task
//!   does — return, error, panic, or abort. A [`DoneSignal`] owned by the
//!   task sends it from its `Drop` impl, which also makes the ordering
//!   structural: the run's outcome is materialized before the sentinel,
//!   and every event the run produced precedes it in the FIFO channel.
//! - dropping the [`RunTask`] aborts the task, so a client disconnect can
//!   never leave a run (and its model calls) going in the background.

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::{JoinError, JoinHandle};

use crate::errors::AgentError;
use crate::event::QueueItem;

/// Completion hook: enqueues the sentinel when dropped.
struct DoneSignal(UnboundedSender<QueueItem>);

impl Drop for DoneSignal {
    fn drop(&mut self) {
        // The receiver may already be gone (client disconnected); that is
        // not an error.
        let _ = self.0.send(QueueItem::Done);
    }
}

/// Handle to an in-flight agent run. Aborts the run when dropped.
pub struct RunTask {
    handle: Option<JoinHandle<Result<String, AgentError>>>,
}

impl RunTask {
    /// Wait for the task's outcome. Consumes the handle; the underlying
    /// task is finished (not aborted) once this returns.
    pub async fn join(mut self) -> Result<Result<String, AgentError>, JoinError> {
        let handle = self.handle.take().expect("RunTask joined twice");
        handle.await
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for RunTask {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

/// Launch `op` as a background task wired to a request's event channel.
pub fn spawn<F>(op: F, events: UnboundedSender<QueueItem>) -> RunTask
where
    F: Future<Output = Result<String, AgentError>> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let _done = DoneSignal(events);
        op.await
    });
    RunTask {
        handle: Some(handle),
    }
}
