//! OpenRouter chat-completions client.
//!
//! OpenRouter speaks the OpenAI wire format, including function-style tool
//! calling. The client is deliberately thin: build a request, retry on
//! transient failures, hand back the assistant's reply. Everything above it
//! (tool dispatch, conversation state) lives in the agent loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::AgentError;

/// Attempts per chat call before giving up on a transient failure.
const MAX_ATTEMPTS: u32 = 3;
/// Backoff before the second attempt; doubles each retry.
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// One element of a user prompt: text, or a reference to an uploaded image.
#[derive(Debug, Clone)]
pub enum PromptPart {
    Text(String),
    ImageUrl(String),
}

// ── Wire types ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(text: String) -> Self {
        Self {
            role: "system",
            content: Some(MessageContent::Text(text)),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// User message from ordered prompt parts. A single text part collapses
    /// to the plain-string form most providers prefer.
    pub fn user(parts: Vec<PromptPart>) -> Self {
        let content = match parts.as_slice() {
            [PromptPart::Text(text)] => MessageContent::Text(text.clone()),
            _ => MessageContent::Parts(
                parts
                    .into_iter()
                    .map(|part| match part {
                        PromptPart::Text(text) => ContentPart::Text { text },
                        PromptPart::ImageUrl(url) => ContentPart::ImageUrl {
                            image_url: ImageUrlRef { url },
                        },
                    })
                    .collect(),
            ),
        };
        Self {
            role: "user",
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// The assistant turn that requested tool calls, echoed back verbatim so
    /// the provider can match tool results to requests.
    pub fn assistant(reply: &AssistantReply) -> Self {
        Self {
            role: "assistant",
            content: reply.content.clone().map(MessageContent::Text),
            tool_calls: reply.tool_calls.clone(),
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: String, output: String) -> Self {
        Self {
            role: "tool",
            content: Some(MessageContent::Text(output)),
            tool_calls: None,
            tool_call_id: Some(call_id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrlRef },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrlRef {
    pub url: String,
}

/// A function-style tool exposed to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionSpec,
}

impl ToolDefinition {
    pub fn function(name: &str, description: &str, parameters: serde_json::Value) -> Self {
        Self {
            kind: "function",
            function: FunctionSpec {
                name: name.to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object, exactly as the model produced it.
    pub arguments: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [ToolDefinition],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantReply,
}

/// The assistant's reply: final text, tool-call requests, or both.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantReply {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

// ── Client ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
}

impl OpenRouterClient {
    pub fn new(config: &Config) -> Result<Self, AgentError> {
        let api_key = config.require_api_key()?.to_string();
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            url: config.provider_url.clone(),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One chat-completion round trip, with up to [`MAX_ATTEMPTS`] tries on
    /// transient failures (transport errors, HTTP 429/5xx).
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<AssistantReply, AgentError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            tools,
        };

        let mut backoff = INITIAL_BACKOFF;
        let mut last_failure = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(&body).await {
                Ok(reply) => return Ok(reply),
                Err(err) if is_transient(&err) && attempt < MAX_ATTEMPTS => {
                    tracing::warn!(attempt, "provider call failed, retrying: {err}");
                    last_failure = err.to_string();
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(err) if is_transient(&err) => {
                    last_failure = err.to_string();
                }
                Err(err) => return Err(err),
            }
        }

        Err(AgentError::Exhausted {
            attempts: MAX_ATTEMPTS,
            message: last_failure,
        })
    }

    async fn attempt(&self, body: &ChatRequest<'_>) -> Result<AssistantReply, AgentError> {
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(AgentError::Provider {
                status: status.as_u16(),
                message: truncate(&message, 500),
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(AgentError::MalformedResponse)
    }
}

/// Failures worth retrying: transport errors and rate-limit/server statuses.
fn is_transient(err: &AgentError) -> bool {
    match err {
        AgentError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        AgentError::Provider { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let mut end = max_len;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_model_messages_and_tools() {
        let messages = vec![
            ChatMessage::system("You are an engineer.".to_string()),
            ChatMessage::user(vec![PromptPart::Text("build an app".to_string())]),
        ];
        let tools = vec![ToolDefinition::function(
            "write_file",
            "Write a file",
            serde_json::json!({"type": "object"}),
        )];
        let body = ChatRequest {
            model: "google/gemini-3-flash-preview:nitro",
            messages: &messages,
            tools: &tools,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "google/gemini-3-flash-preview:nitro");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "build an app");
        assert_eq!(json["tools"][0]["type"], "function");
        assert_eq!(json["tools"][0]["function"]["name"], "write_file");
    }

    #[test]
    fn user_message_with_images_becomes_part_list() {
        let msg = ChatMessage::user(vec![
            PromptPart::Text("match this mood".to_string()),
            PromptPart::ImageUrl("https://example.com/ref.png".to_string()),
        ]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][1]["type"], "image_url");
        assert_eq!(
            json["content"][1]["image_url"]["url"],
            "https://example.com/ref.png"
        );
    }

    #[test]
    fn empty_tool_list_is_omitted_from_request() {
        let messages = vec![ChatMessage::user(vec![PromptPart::Text("hi".to_string())])];
        let body = ChatRequest {
            model: "m",
            messages: &messages,
            tools: &[],
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("\"tools\""));
    }

    #[test]
    fn response_with_tool_calls_parses() {
        let raw = r#"{
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "write_file",
                            "arguments": "{\"path\":\"app/index.tsx\",\"content\":\"x\"}"
                        }
                    }]
                }
            }]
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let reply = &parsed.choices[0].message;
        assert!(reply.content.is_none());
        let calls = reply.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "write_file");
        assert!(calls[0].function.arguments.contains("app/index.tsx"));
    }

    #[test]
    fn response_with_plain_content_parses() {
        let raw = r#"{"choices":[{"message":{"content":"Added a settings screen."}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Added a settings screen.")
        );
        assert!(parsed.choices[0].message.tool_calls.is_none());
    }

    #[test]
    fn transient_classification() {
        assert!(is_transient(&AgentError::Provider {
            status: 429,
            message: String::new(),
        }));
        assert!(is_transient(&AgentError::Provider {
            status: 503,
            message: String::new(),
        }));
        assert!(!is_transient(&AgentError::Provider {
            status: 401,
            message: String::new(),
        }));
        assert!(!is_transient(&AgentError::MalformedResponse));
    }

    #[test]
    fn tool_result_message_links_call_id() {
        let msg = ChatMessage::tool_result("call_9".to_string(), "Wrote app/index.tsx".to_string());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "call_9");
        assert_eq!(json["content"], "Wrote app/index.tsx");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        let long = "é".repeat(300);
        let cut = truncate(&long, 5);
        assert!(cut.ends_with("..."));
        assert!(cut.len() <= 8);
    }
}
