//! Server assembly and lifecycle.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::agent::Agent;
use crate::api::{self, AppState};
use crate::config::Config;

/// Build the application router. CORS is wide open: the desktop client
/// calls from a webview origin.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::api_router()
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Construct the agents and serve until shutdown.
///
/// Agent construction validates the provider credential, so a missing API
/// key fails here — before the listener binds, before any request.
pub async fn start_server(config: Config) -> Result<()> {
    let scaffold = Agent::scaffold(&config).context("Failed to construct scaffold agent")?;
    let editor = Agent::editor(&config).context("Failed to construct editor agent")?;

    let state = Arc::new(AppState {
        scaffold: Arc::new(scaffold),
        editor: Arc::new(editor),
    });

    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    println!(
        "Agent service running at http://{} (model: {})",
        local_addr, config.model
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    println!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    println!("\nShutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentRunner;
    use crate::agent::context::RunContext;
    use crate::provider::PromptPart;
    use crate::runner::{self, RunTask};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct NoopRunner;

    impl AgentRunner for NoopRunner {
        fn spawn_run(&self, _parts: Vec<PromptPart>, ctx: Arc<RunContext>) -> RunTask {
            runner::spawn(async move { Ok("noop".to_string()) }, ctx.event_sender())
        }
    }

    fn test_router() -> Router {
        let state = Arc::new(AppState {
            scaffold: Arc::new(NoopRunner),
            editor: Arc::new(NoopRunner),
        });
        build_router(state)
    }

    #[tokio::test]
    async fn health_via_full_router() {
        let app = test_router();
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = test_router();
        let req = Request::builder()
            .uri("/nonexistent")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_preflight_is_permitted() {
        let app = test_router();
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/generate")
            .header("origin", "http://localhost:1420")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert!(resp.status().is_success());
        assert!(
            resp.headers()
                .contains_key("access-control-allow-origin")
        );
    }

    #[tokio::test]
    async fn startup_fails_without_api_key() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            api_key: None,
            model: "m".to_string(),
            provider_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
        };
        let err = start_server(config).await.unwrap_err();
        assert!(err.to_string().contains("scaffold agent"));
    }
}
