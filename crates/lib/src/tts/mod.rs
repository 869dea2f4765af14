//! Text-to-speech abstraction and ElevenLabs client.
//!
//! The relay only depends on [`Synthesizer`]; the ElevenLabs client is the production
//! implementation.

mod elevenlabs;

use async_trait::async_trait;

pub use elevenlabs::{ElevenLabsClient, Voice};

/// Failure of a synthesis (or other API) call.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    /// The API answered with a non-success status.
    #[error("synthesis failed: {status} {body}")]
    SynthesisFailed { status: u16, body: String },
    /// Connection, timeout, or body read failure.
    #[error("synthesis request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// A success response whose body is not the expected JSON.
    #[error("invalid API response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Turns text into opaque audio bytes.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError>;
}
