//! The relay shared by both front ends: reply text, then audio for it.

use crate::config::FailurePolicy;
use crate::reply::{EchoReply, ReplyGenerator};
use crate::tts::{SynthesisError, Synthesizer};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error("{0}")]
    Unexpected(String),
}

impl From<std::io::Error> for RelayError {
    fn from(e: std::io::Error) -> Self {
        RelayError::Unexpected(e.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::Unexpected(e.to_string())
    }
}

/// Reply text and, when synthesis succeeded, base64 audio. `audio` serializes as `null`
/// when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub audio: Option<String>,
}

/// Reply generator plus synthesizer. Cheap to clone; holds no mutable state.
#[derive(Clone)]
pub struct Relay {
    replies: Arc<dyn ReplyGenerator>,
    synthesizer: Arc<dyn Synthesizer>,
}

impl Relay {
    pub fn new(replies: Arc<dyn ReplyGenerator>, synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self {
            replies,
            synthesizer,
        }
    }

    /// Relay using the echo reply template.
    pub fn echo(synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self::new(Arc::new(EchoReply), synthesizer)
    }

    pub fn reply_text(&self, input: &str) -> String {
        self.replies.generate(input)
    }

    /// Synthesize `text` and return the audio as standard base64.
    pub async fn synthesize_base64(&self, text: &str) -> Result<String, SynthesisError> {
        let audio = self.synthesizer.synthesize(text).await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&audio);
        log::debug!("encoded audio: {} bytes -> {} chars", audio.len(), encoded.len());
        Ok(encoded)
    }

    /// Full relay for one input. Under [`FailurePolicy::Degrade`] a synthesis failure is
    /// logged and the reply comes back without audio; under `Abort` it is returned.
    pub async fn respond(&self, input: &str, policy: FailurePolicy) -> Result<Reply, RelayError> {
        let text = self.reply_text(input);
        log::debug!("generated reply text: {}", text);
        match self.synthesize_base64(&text).await {
            Ok(audio) => Ok(Reply {
                text,
                audio: Some(audio),
            }),
            Err(e) => match policy {
                FailurePolicy::Abort => {
                    log::error!("audio generation failed: {}", e);
                    Err(e.into())
                }
                FailurePolicy::Degrade => {
                    log::warn!("audio generation failed, replying with text only: {}", e);
                    Ok(Reply { text, audio: None })
                }
            },
        }
    }
}
