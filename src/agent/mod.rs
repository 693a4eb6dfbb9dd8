//! Model-backed agents and the tool-call loop that drives them.
//!
//! An [`Agent`] pairs a provider client with a system prompt and a tool
//! registry. `run` is the whole conversation: send the messages, execute
//! any tool calls the model requests, feed the results back, and stop when
//! the model answers with plain text — that text is the run's summary.

pub mod context;
pub mod prompts;
pub mod tools;

use std::sync::Arc;

use crate::config::Config;
use crate::errors::AgentError;
use crate::provider::{ChatMessage, OpenRouterClient, PromptPart};
use crate::runner::{self, RunTask};

use self::context::RunContext;
use self::tools::{EditWriteFile, ScaffoldWriteFile, Tool, ToolRegistry};

/// Hard cap on model turns per run; a scaffold writes tens of files, not
/// hundreds.
const MAX_TURNS: usize = 64;

/// Seam between the HTTP layer and agent execution, so tests can drive the
/// full streaming path with a scripted run instead of a live provider.
pub trait AgentRunner: Send + Sync {
    fn spawn_run(&self, parts: Vec<PromptPart>, ctx: Arc<RunContext>) -> RunTask;
}

#[derive(Clone)]
pub struct Agent {
    client: OpenRouterClient,
    system_prompt: &'static str,
    tools: Arc<ToolRegistry>,
}

impl Agent {
    /// The app-scaffolding agent. Fails fast if the provider credential is
    /// missing — before any request is served.
    pub fn scaffold(config: &Config) -> Result<Self, AgentError> {
        Self::new(config, prompts::SCAFFOLD_SYSTEM_PROMPT, Arc::new(ScaffoldWriteFile))
    }

    /// The single-file editor agent.
    pub fn editor(config: &Config) -> Result<Self, AgentError> {
        Self::new(config, prompts::EDITOR_SYSTEM_PROMPT, Arc::new(EditWriteFile))
    }

    fn new(
        config: &Config,
        system_prompt: &'static str,
        write_tool: Arc<dyn Tool>,
    ) -> Result<Self, AgentError> {
        let client = OpenRouterClient::new(config)?;
        Ok(Self {
            client,
            system_prompt,
            tools: Arc::new(ToolRegistry::new().register(write_tool)),
        })
    }

    /// Drive one conversation to completion. Returns the model's final text
    /// summary; file writes happen as side effects through the tools.
    pub async fn run(
        &self,
        parts: Vec<PromptPart>,
        ctx: Arc<RunContext>,
    ) -> Result<String, AgentError> {
        let definitions = self.tools.definitions();
        let mut messages = build_messages(self.system_prompt, &ctx, parts);

        for turn in 0..MAX_TURNS {
            let reply = self.client.chat(&messages, &definitions).await?;

            let calls = reply.tool_calls.clone().unwrap_or_default();
            if calls.is_empty() {
                let summary = reply.content.ok_or(AgentError::MalformedResponse)?;
                tracing::info!(run_id = %ctx.run_id, turns = turn + 1, "agent run completed");
                return Ok(summary);
            }

            messages.push(ChatMessage::assistant(&reply));
            for call in calls {
                let output = self
                    .tools
                    .dispatch(&ctx, &call.function.name, &call.function.arguments)
                    .await;
                messages.push(ChatMessage::tool_result(call.id, output));
            }
        }

        Err(AgentError::TurnLimit { limit: MAX_TURNS })
    }

    #[cfg(test)]
    pub(crate) fn tool_definitions(&self) -> Vec<crate::provider::ToolDefinition> {
        self.tools.definitions()
    }
}

impl AgentRunner for Agent {
    fn spawn_run(&self, parts: Vec<PromptPart>, ctx: Arc<RunContext>) -> RunTask {
        let agent = self.clone();
        let events = ctx.event_sender();
        runner::spawn(async move { agent.run(parts, ctx).await }, events)
    }
}

/// Initial message list: static system prompt + per-request dynamic section,
/// then the user's prompt parts in order.
fn build_messages(
    system_prompt: &str,
    ctx: &RunContext,
    parts: Vec<PromptPart>,
) -> Vec<ChatMessage> {
    let system = format!("{system_prompt}{}", prompts::dynamic_section(&ctx.spec));
    vec![ChatMessage::system(system), ChatMessage::user(parts)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::context::{RunSpec, ScaffoldSpec};
    use tokio::sync::mpsc;

    fn test_config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            api_key: Some("sk-or-test".to_string()),
            model: "google/gemini-3-flash-preview:nitro".to_string(),
            provider_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
        }
    }

    fn scaffold_ctx() -> Arc<RunContext> {
        let (tx, _rx) = mpsc::unbounded_channel();
        Arc::new(RunContext::new(
            RunSpec::Scaffold(ScaffoldSpec {
                project_path: "/projects/demo".to_string(),
                app_name: "Demo".to_string(),
                brand_color: Some("#2563EB".to_string()),
            }),
            tx,
        ))
    }

    #[test]
    fn agent_construction_requires_credential() {
        let mut config = test_config();
        config.api_key = None;
        assert!(matches!(
            Agent::scaffold(&config),
            Err(AgentError::MissingApiKey { .. })
        ));
        assert!(Agent::scaffold(&test_config()).is_ok());
    }

    #[test]
    fn both_agents_expose_exactly_write_file() {
        let config = test_config();
        for agent in [
            Agent::scaffold(&config).unwrap(),
            Agent::editor(&config).unwrap(),
        ] {
            let defs = agent.tool_definitions();
            assert_eq!(defs.len(), 1);
            assert_eq!(defs[0].function.name, "write_file");
        }
    }

    #[test]
    fn message_list_opens_with_augmented_system_prompt() {
        let ctx = scaffold_ctx();
        let messages = build_messages(
            prompts::SCAFFOLD_SYSTEM_PROMPT,
            &ctx,
            vec![
                PromptPart::Text("build a habit tracker".to_string()),
                PromptPart::ImageUrl("https://example.com/mock.png".to_string()),
            ],
        );

        assert_eq!(messages.len(), 2);
        let system = serde_json::to_string(&messages[0]).unwrap();
        assert!(system.contains("expert React Native engineer"));
        assert!(system.contains("Demo"));
        assert!(system.contains("#2563EB"));

        let user = serde_json::to_value(&messages[1]).unwrap();
        assert_eq!(user["content"][0]["text"], "build a habit tracker");
        assert_eq!(user["content"][1]["type"], "image_url");
    }
}
