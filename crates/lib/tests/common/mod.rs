//! Mock text-to-speech API for integration tests: serves a fixed status and body on
//! `POST /v1/text-to-speech/:voice_id` and records each request.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use lib::config::{TtsSettings, VoiceSettings};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use std::time::Duration;

pub const API_KEY: &str = "test-key";
pub const VOICE_ID: &str = "voice-1";
pub const MALFORMED_KEY: &str = "malformed-key";

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub voice_id: String,
    pub api_key: Option<String>,
    pub accept: Option<String>,
    pub body: serde_json::Value,
}

pub struct Upstream {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl Upstream {
    pub fn captured(&self) -> Vec<CapturedRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

#[derive(Clone)]
struct UpstreamState {
    status: StatusCode,
    body: Vec<u8>,
    delay: Duration,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

async fn text_to_speech(
    State(state): State<UpstreamState>,
    Path(voice_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Vec<u8>) {
    state.requests.lock().expect("lock").push(CapturedRequest {
        voice_id,
        api_key: header(&headers, "xi-api-key"),
        accept: header(&headers, "accept"),
        body,
    });
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    (state.status, state.body.clone())
}

/// With [`MALFORMED_KEY`] the list comes back as a 200 with a body that is not JSON.
async fn voices(headers: HeaderMap) -> Response {
    match header(&headers, "xi-api-key").as_deref() {
        Some(API_KEY) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "voices": [
                    { "voice_id": "v9j1d3wLyU7N2cUz1uBQ", "name": "Rick" },
                    { "voice_id": "ErXwobaYiN019PkySvjV", "name": "Antoni" }
                ]
            })),
        )
            .into_response(),
        Some(MALFORMED_KEY) => (StatusCode::OK, "<html>maintenance</html>").into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "detail": "invalid api key" })),
        )
            .into_response(),
    }
}

/// Answers every connection with a 500 whose declared body is longer than what is sent,
/// then closes, so reading the error body fails.
pub async fn spawn_truncated_error_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind upstream");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_request(&mut socket).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 500 Internal Server Error\r\n\
                          content-type: text/plain\r\n\
                          content-length: 100\r\n\r\npartial",
                    )
                    .await;
                let _ = socket.flush().await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{}/v1", addr)
}

/// Read one request (headers plus content-length body) so the client is not reset
/// before it sees the response.
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let body_len = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + body_len {
            return;
        }
    }
}

/// Start the mock upstream on a free loopback port. The server task is left running
/// when the test ends.
pub async fn spawn_upstream(status: StatusCode, body: impl Into<Vec<u8>>, delay: Duration) -> Upstream {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = UpstreamState {
        status,
        body: body.into(),
        delay,
        requests: requests.clone(),
    };
    let app = Router::new()
        .route("/v1/text-to-speech/:voice_id", post(text_to_speech))
        .route("/v1/voices", get(voices))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind upstream");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Upstream {
        base_url: format!("http://{}/v1", addr),
        requests,
    }
}

/// A base URL nothing is listening on.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    let port = listener.local_addr().expect("local_addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}/v1", port)
}

pub fn settings(base_url: &str, timeout: Duration) -> TtsSettings {
    TtsSettings {
        base_url: base_url.to_string(),
        api_key: API_KEY.to_string(),
        voice_id: VOICE_ID.to_string(),
        model_id: "eleven_monolingual_v1".to_string(),
        voice_settings: VoiceSettings::default(),
        timeout,
    }
}
