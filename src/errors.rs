//! Typed error hierarchy for the agent service.
//!
//! `AgentError` covers everything that can go wrong between accepting a
//! request and the model returning its final summary. Failures inside a
//! stream never surface as HTTP errors — the stream bridge converts them
//! into a single in-band `error` event.

use thiserror::Error;

/// Errors from agent construction and agent runs.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{var} environment variable is not set")]
    MissingApiKey { var: &'static str },

    #[error("provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("provider unavailable after {attempts} attempts: {message}")]
    Exhausted { attempts: u32, message: String },

    #[error("provider response had no usable content")]
    MalformedResponse,

    #[error("run exceeded {limit} model turns without completing")]
    TurnLimit { limit: usize },

    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
}
