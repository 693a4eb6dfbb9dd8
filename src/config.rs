//! Runtime configuration, sourced from the environment with CLI overrides.
//!
//! `dotenvy` is loaded in `main` before this runs, so a local `.env` file
//! behaves like real environment variables.

use crate::errors::AgentError;

/// Environment variable holding the OpenRouter credential.
pub const API_KEY_VAR: &str = "OPEN_ROUTER_API_KEY";

const DEFAULT_MODEL: &str = "google/gemini-3-flash-preview:nitro";
const DEFAULT_PROVIDER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Absent until an agent is constructed; missing credentials are a
    /// startup failure, not a per-request one.
    pub api_key: Option<String>,
    pub model: String,
    pub provider_url: String,
}

impl Config {
    /// Build the config from the environment, with host/port taken from the
    /// CLI.
    pub fn from_env(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            api_key: std::env::var(API_KEY_VAR).ok().filter(|k| !k.is_empty()),
            model: std::env::var("AGENT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            provider_url: std::env::var("AGENT_PROVIDER_URL")
                .unwrap_or_else(|_| DEFAULT_PROVIDER_URL.to_string()),
        }
    }

    /// The credential, or the startup error that names the missing variable.
    pub fn require_api_key(&self) -> Result<&str, AgentError> {
        self.api_key
            .as_deref()
            .ok_or(AgentError::MissingApiKey { var: API_KEY_VAR })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: Option<&str>) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8000,
            api_key: key.map(str::to_string),
            model: DEFAULT_MODEL.to_string(),
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
        }
    }

    #[test]
    fn require_api_key_fails_without_credential() {
        let config = config_with_key(None);
        match config.require_api_key() {
            Err(AgentError::MissingApiKey { var }) => assert_eq!(var, API_KEY_VAR),
            other => panic!("Expected MissingApiKey, got {:?}", other.map(str::to_string)),
        }
    }

    #[test]
    fn require_api_key_returns_credential() {
        let config = config_with_key(Some("sk-or-test"));
        assert_eq!(config.require_api_key().unwrap(), "sk-or-test");
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let config = config_with_key(None);
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
    }
}
