//! Per-request state bundle.
//!
//! One `RunContext` is constructed for each inbound request and passed
//! explicitly through the runner, the tools, and the stream bridge. Nothing
//! here is shared across requests.

use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::event::{AgentEvent, QueueItem};

/// What a run was asked to do.
#[derive(Debug, Clone)]
pub enum RunSpec {
    Scaffold(ScaffoldSpec),
    Edit(EditSpec),
}

#[derive(Debug, Clone)]
pub struct ScaffoldSpec {
    pub project_path: String,
    pub app_name: String,
    pub brand_color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EditSpec {
    pub project_path: String,
    pub relative_path: String,
    /// Current content of the file being edited, injected into the prompt.
    pub content: String,
}

/// One file the model produced during this run.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenFile {
    pub path: String,
    pub content: String,
}

pub struct RunContext {
    pub run_id: Uuid,
    pub spec: RunSpec,
    files_written: Mutex<Vec<WrittenFile>>,
    events: UnboundedSender<QueueItem>,
}

impl RunContext {
    pub fn new(spec: RunSpec, events: UnboundedSender<QueueItem>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            spec,
            files_written: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Sender feeding this request's event channel.
    pub fn event_sender(&self) -> UnboundedSender<QueueItem> {
        self.events.clone()
    }

    /// Enqueue a progress event. Never blocks; a closed channel (client
    /// gone) is silently ignored.
    pub fn push_event(&self, event: AgentEvent) {
        let _ = self.events.send(QueueItem::Event(event));
    }

    /// Record a produced file and announce it to the client.
    pub fn record_write(&self, path: String, full_path: Option<String>, content: String) {
        self.files_written
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(WrittenFile {
                path: path.clone(),
                content: content.clone(),
            });
        self.push_event(AgentEvent::FileWrite {
            path,
            full_path,
            content,
        });
    }

    /// Paths of every recorded file, in write order.
    pub fn file_paths(&self) -> Vec<String> {
        self.files_written
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .map(|f| f.path.clone())
            .collect()
    }
}
