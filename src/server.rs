//! HTTP surface: health probe and manual run trigger.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::runner::Runner;
use crate::{AppError, Result};

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Run coordinator shared with the schedule loop.
    pub runner: Arc<Runner>,
    /// Bearer token required by `POST /run`, if configured.
    pub trigger_token: Option<String>,
}

/// Build the router.
#[must_use]
pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/run", post(trigger_run))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

async fn trigger_run(State(state): State<HttpState>, headers: HeaderMap) -> Response {
    if let Some(expected) = state.trigger_token.as_deref() {
        if bearer_token(&headers) != Some(expected) {
            warn!("rejected run trigger with missing or wrong token");
            return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
        }
    }

    match state.runner.run_now().await {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

/// Serve the router on `bind` until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Io` if the listener cannot bind or the server fails.
pub async fn serve(state: HttpState, bind: SocketAddr, ct: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Io(format!("failed to bind http on {bind}: {err}")))?;

    info!(%bind, "starting http trigger surface");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Io(format!("http server error: {err}")))?;

    info!("http trigger surface shut down");
    Ok(())
}
