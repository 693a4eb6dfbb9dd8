//! Progress events pushed from a running agent operation to the client.
//!
//! One `AgentEvent` becomes exactly one SSE frame (`data: <json>\n\n`).
//! Events travel through a per-request unbounded channel as `QueueItem`s;
//! `QueueItem::Done` is the end-of-stream sentinel, enqueued exactly once
//! after the operation reaches a terminal state.

use axum::response::sse::Event;
use serde::{Deserialize, Serialize};

/// One discrete progress update, tagged for the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    Status {
        message: String,
    },
    FileWrite {
        path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        full_path: Option<String>,
        content: String,
    },
    Done {
        summary: String,
        files: Vec<String>,
    },
    Error {
        message: String,
    },
}

impl AgentEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// True for the events that close a stream (`done` / `error`).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

/// Item carried by a request's event channel: a real event or the sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueItem {
    Event(AgentEvent),
    Done,
}

/// Encode one event as one SSE frame.
///
/// Returns `None` (and logs) if serialization fails, so a bad event skips a
/// frame instead of tearing down the stream.
pub fn encode(event: &AgentEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().data(json)),
        Err(e) => {
            tracing::warn!("failed to serialize agent event: {e}");
            None
        }
    }
}
