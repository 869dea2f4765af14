//! Webhook: HTTP front end for the relay.
//!
//! `POST /webhook/audio` takes a message and answers with the reply text and base64
//! audio; `GET /health` is a static liveness probe.

mod protocol;
mod server;

pub use protocol::{HealthStatus, InboundMessage, OutboundMessage};
pub use server::{router, run_webhook, serve, WebhookState};
