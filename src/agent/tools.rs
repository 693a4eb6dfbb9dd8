//! Explicit tool registry.
//!
//! The model sees each tool as a function definition; calls are dispatched
//! by name against this registry. Tool failures — unknown name, bad
//! arguments, rejected paths — are returned to the model as plain strings
//! so it can correct itself; they never abort the run.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::agent::context::{RunContext, RunSpec};
use crate::provider::ToolDefinition;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON schema for the tool's argument object.
    fn parameters(&self) -> serde_json::Value;
    /// Execute the tool. The returned string goes back to the model as the
    /// tool result, including error text.
    async fn call(&self, ctx: &RunContext, args: serde_json::Value) -> String;
}

/// Name → handler map declared per agent. Registration order is preserved
/// so tool definitions reach the provider deterministically.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition::function(t.name(), t.description(), t.parameters()))
            .collect()
    }

    /// Dispatch one model tool call. `raw_args` is the JSON argument string
    /// exactly as the model produced it.
    pub async fn dispatch(&self, ctx: &RunContext, name: &str, raw_args: &str) -> String {
        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            return format!("Error: unknown tool '{name}'");
        };
        let args = match serde_json::from_str(raw_args) {
            Ok(value) => value,
            Err(e) => return format!("Error: invalid arguments for {name}: {e}"),
        };
        tool.call(ctx, args).await
    }
}

// ── write_file (scaffold) ─────────────────────────────────────────────

/// Scaffold-flow `write_file(path, content)`. The path comes from the model
/// and must stay inside the project.
pub struct ScaffoldWriteFile;

#[derive(Deserialize)]
struct ScaffoldWriteArgs {
    path: String,
    content: String,
}

#[async_trait]
impl Tool for ScaffoldWriteFile {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Write a file to the Expo project. \
         path must be relative to the project root e.g. 'app/(tabs)/index.tsx'. \
         Use this tool for every file you create or update."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the project root"
                },
                "content": {
                    "type": "string",
                    "description": "Complete file content"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn call(&self, ctx: &RunContext, args: serde_json::Value) -> String {
        let args: ScaffoldWriteArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return format!("Error: invalid arguments for write_file: {e}"),
        };

        if args.path.contains("..") || args.path.starts_with('/') {
            return "Error: path must be relative with no '..'".to_string();
        }

        tracing::debug!(run_id = %ctx.run_id, path = %args.path, "model wrote file");
        let path = args.path.clone();
        ctx.record_write(args.path, None, args.content);
        format!("Wrote {path}")
    }
}

// ── write_file (edit) ─────────────────────────────────────────────────

/// Edit-flow `write_file(content)`. The target path is fixed by the request,
/// so the model only supplies new content.
pub struct EditWriteFile;

#[derive(Deserialize)]
struct EditWriteArgs {
    content: String,
}

#[async_trait]
impl Tool for EditWriteFile {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Write the corrected file content. The file path is fixed by the \
         request; always use this tool to apply your change."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "Complete corrected file content"
                }
            },
            "required": ["content"]
        })
    }

    async fn call(&self, ctx: &RunContext, args: serde_json::Value) -> String {
        let args: EditWriteArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return format!("Error: invalid arguments for write_file: {e}"),
        };

        let RunSpec::Edit(spec) = &ctx.spec else {
            return "Error: write_file(content) is only available while editing a file".to_string();
        };

        let full_path = Path::new(&spec.project_path)
            .join(&spec.relative_path)
            .to_string_lossy()
            .into_owned();
        let relative = spec.relative_path.clone();
        tracing::debug!(run_id = %ctx.run_id, path = %relative, "model rewrote file");
        ctx.record_write(relative.clone(), Some(full_path), args.content);
        format!("Successfully wrote {relative}")
    }
}
