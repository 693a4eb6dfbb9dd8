//! The stream bridge: one request's lifecycle, from background run to SSE.
//!
//! The bridge owns three things for the duration of a response: the event
//! channel receiver, the [`RunTask`] handle, and the request's
//! [`RunContext`]. It emits an immediate `status` event, relays every
//! progress event in FIFO order, and — once the sentinel arrives — resolves
//! the task's outcome into exactly one terminal `done` or `error` event.
//!
//! Failure policy: nothing below this layer may break the HTTP stream. Run
//! errors, panics, and cancellations are logged and converted into the
//! in-band `error` event; the response itself always ends cleanly.
//!
//! Dropping the returned stream (client disconnect, normal completion)
//! drops the `RunTask`, which aborts the background run. No run outlives
//! its stream.

use std::convert::Infallible;
use std::sync::Arc;

use axum::response::sse::Event;
use futures_util::{Stream, StreamExt, stream};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::agent::context::RunContext;
use crate::event::{self, AgentEvent, QueueItem};
use crate::runner::RunTask;

/// First event on every stream, sent before any run output.
const INIT_MESSAGE: &str = "Agent initialized...";

struct Inner {
    ctx: Arc<RunContext>,
    rx: UnboundedReceiver<QueueItem>,
    task: Option<RunTask>,
}

enum BridgeState {
    Start(Inner),
    Drain(Inner),
    Closed,
}

/// Build the SSE stream for one run: every event encoded as one
/// `data: <json>` frame.
pub fn bridge_stream(
    ctx: Arc<RunContext>,
    rx: UnboundedReceiver<QueueItem>,
    task: RunTask,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    event_stream(ctx, rx, task).map(|ev| Ok(encode_frame(&ev)))
}

/// The bridge proper, at the event level. Separated from SSE encoding so
/// the lifecycle contract is directly testable.
fn event_stream(
    ctx: Arc<RunContext>,
    rx: UnboundedReceiver<QueueItem>,
    task: RunTask,
) -> impl Stream<Item = AgentEvent> + Send + 'static {
    let inner = Inner {
        ctx,
        rx,
        task: Some(task),
    };

    stream::unfold(BridgeState::Start(inner), |state| async move {
        match state {
            BridgeState::Start(inner) => Some((
                AgentEvent::status(INIT_MESSAGE),
                BridgeState::Drain(inner),
            )),

            BridgeState::Drain(mut inner) => match inner.rx.recv().await {
                Some(QueueItem::Event(ev)) => Some((ev, BridgeState::Drain(inner))),
                // Sentinel — or a closed channel, which can only mean the
                // producer side is gone; either way the run is over.
                Some(QueueItem::Done) | None => {
                    let terminal = resolve(&inner.ctx, inner.task.take()).await;
                    Some((terminal, BridgeState::Closed))
                }
            },

            BridgeState::Closed => None,
        }
    })
}

/// Fetch the task outcome and shape the terminal event. Every failure mode
/// lands here as an `error` event rather than a transport fault.
async fn resolve(ctx: &Arc<RunContext>, task: Option<RunTask>) -> AgentEvent {
    let Some(task) = task else {
        // Unreachable by construction; still terminate the stream sanely.
        return AgentEvent::error("run handle was already consumed");
    };

    match task.join().await {
        Ok(Ok(summary)) => AgentEvent::Done {
            summary,
            files: ctx.file_paths(),
        },
        Ok(Err(err)) => {
            tracing::error!(run_id = %ctx.run_id, "agent run failed: {err}");
            AgentEvent::error(err.to_string())
        }
        Err(join_err) => {
            tracing::error!(run_id = %ctx.run_id, "agent task did not complete: {join_err}");
            let message = if join_err.is_panic() {
                "agent task panicked".to_string()
            } else {
                "agent task was cancelled".to_string()
            };
            AgentEvent::error(message)
        }
    }
}

/// Encode, falling back to a minimal hand-built error frame so the stream
/// always terminates with *some* event.
fn encode_frame(ev: &AgentEvent) -> Event {
    event::encode(ev).unwrap_or_else(|| {
        Event::default().data(r#"{"type":"error","message":"event serialization failed"}"#)
    })
}
