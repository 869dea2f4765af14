//! Webhook HTTP server.

use crate::config::{Config, FailurePolicy};
use crate::relay::{Relay, RelayError};
use crate::tts::{ElevenLabsClient, SynthesisError};
use crate::webhook::protocol::{HealthStatus, InboundMessage, OutboundMessage};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared state for the webhook handlers. Immutable after startup.
#[derive(Clone)]
pub struct WebhookState {
    pub relay: Relay,
    /// Default `Abort`: a failed synthesis fails the request.
    pub policy: FailurePolicy,
}

/// Error response: `{ "detail": ... }` with a status derived from the failure kind.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        match e {
            RelayError::Synthesis(SynthesisError::SynthesisFailed { status, body }) => ApiError {
                status: upstream_status(status),
                detail: format!("text-to-speech API error: {}", body),
            },
            RelayError::Synthesis(SynthesisError::Transport(e)) => ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: format!("API request error: {}", e),
            },
            RelayError::Synthesis(e @ SynthesisError::Decode(_)) => ApiError {
                status: StatusCode::BAD_GATEWAY,
                detail: format!("text-to-speech API error: {}", e),
            },
            RelayError::Unexpected(msg) => ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: format!("Internal server error: {}", msg),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Mirror the upstream status when it is an error status; anything else becomes 502.
fn upstream_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status)
        .ok()
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook/audio", post(audio_webhook))
        .route("/health", get(health_http))
        .with_state(state)
}

/// Build the relay from config, bind, and serve until SIGINT/SIGTERM.
pub async fn run_webhook(config: Config) -> Result<()> {
    let settings = config.tts_settings()?;
    log::debug!("text-to-speech settings: {:?}", settings);
    let client = ElevenLabsClient::new(settings).context("building text-to-speech client")?;
    log::info!("using voice {}", client.voice_id());
    let state = WebhookState {
        relay: Relay::echo(Arc::new(client)),
        policy: config.webhook.on_synthesis_failure,
    };

    let bind_addr = format!("{}:{}", config.webhook.bind.trim(), config.webhook.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("starting audio webhook server on {}", bind_addr);
    serve(listener, state, shutdown_signal()).await
}

/// Serve the webhook on an already-bound listener until `shutdown` completes.
pub async fn serve<F>(listener: TcpListener, state: WebhookState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("webhook server exited")?;
    log::info!("shutting down audio webhook server");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /webhook/audio — reply text plus base64 audio for it.
async fn audio_webhook(
    State(state): State<WebhookState>,
    Json(message): Json<InboundMessage>,
) -> Result<Json<OutboundMessage>, ApiError> {
    log::debug!(
        "received webhook request: user_id={} session_id={:?} text={:?}",
        message.user_id,
        message.session_id,
        message.text
    );
    let reply = state.relay.respond(&message.text, state.policy).await?;
    log::debug!("sending response back to client");
    Ok(Json(OutboundMessage {
        text: reply.text,
        audio: reply.audio,
        user_id: message.user_id,
        session_id: message.session_id,
    }))
}

/// GET /health returns a fixed liveness JSON (for probes). No dependency checks.
async fn health_http() -> Json<HealthStatus> {
    Json(HealthStatus::healthy())
}
