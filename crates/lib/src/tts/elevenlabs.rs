//! ElevenLabs API client (https://api.elevenlabs.io/v1 by default).
//! Supports text-to-speech for the configured voice and listing voices.

use super::{SynthesisError, Synthesizer};
use crate::config::{TtsSettings, VoiceSettings};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};

const API_KEY_HEADER: &str = "xi-api-key";
const AUDIO_MIME: &str = "audio/mpeg";

/// Client for the ElevenLabs HTTP API.
#[derive(Clone)]
pub struct ElevenLabsClient {
    settings: TtsSettings,
    client: reqwest::Client,
}

impl ElevenLabsClient {
    /// Builds the HTTP client with the configured timeout; the same bound applies to
    /// every call made through this client.
    pub fn new(settings: TtsSettings) -> Result<Self, SynthesisError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { settings, client })
    }

    pub fn voice_id(&self) -> &str {
        &self.settings.voice_id
    }

    /// POST /text-to-speech/{voice_id} — returns the audio body unchanged.
    pub async fn text_to_speech(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let url = format!(
            "{}/text-to-speech/{}",
            self.settings.base_url, self.settings.voice_id
        );
        log::debug!("tts request: {} ({} chars)", url, text.chars().count());
        let body = SpeechRequest {
            text,
            model_id: &self.settings.model_id,
            voice_settings: WireVoiceSettings::from(self.settings.voice_settings),
        };
        let res = self
            .client
            .post(&url)
            .header(ACCEPT, AUDIO_MIME)
            .header(API_KEY_HEADER, &self.settings.api_key)
            .json(&body)
            .send()
            .await?;
        log::debug!("tts response status: {}", res.status());
        if !res.status().is_success() {
            let err = api_error(res).await;
            log::error!("tts api error response: {}", err);
            return Err(err);
        }
        let audio = res.bytes().await?;
        log::debug!("tts audio received: {} bytes", audio.len());
        Ok(audio.to_vec())
    }

    /// GET /voices — list voices available to this API key.
    pub async fn list_voices(&self) -> Result<Vec<Voice>, SynthesisError> {
        let url = format!("{}/voices", self.settings.base_url);
        let res = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.settings.api_key)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(api_error(res).await);
        }
        let body = res.bytes().await?;
        let data: VoicesResponse = serde_json::from_slice(&body)?;
        Ok(data.voices)
    }
}

/// Non-success response into `SynthesisFailed`. The status is kept even when the body
/// cannot be read; the read error is only logged.
async fn api_error(res: reqwest::Response) -> SynthesisError {
    let status = res.status().as_u16();
    let body = match res.text().await {
        Ok(body) => body,
        Err(e) => {
            log::debug!("reading tts error body failed (status {}): {}", status, e);
            String::new()
        }
    };
    SynthesisError::SynthesisFailed { status, body }
}

#[async_trait]
impl Synthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        self.text_to_speech(text).await
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: WireVoiceSettings,
}

/// The API expects snake_case keys; the config file uses camelCase.
#[derive(Debug, Serialize)]
struct WireVoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

impl From<VoiceSettings> for WireVoiceSettings {
    fn from(v: VoiceSettings) -> Self {
        Self {
            stability: v.stability,
            similarity_boost: v.similarity_boost,
        }
    }
}

/// One voice from GET /voices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<Voice>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn speech_request_body_uses_api_field_names() {
        let body = SpeechRequest {
            text: "You said: hi",
            model_id: "eleven_monolingual_v1",
            voice_settings: WireVoiceSettings::from(VoiceSettings::default()),
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "text": "You said: hi",
                "model_id": "eleven_monolingual_v1",
                "voice_settings": { "stability": 0.5, "similarity_boost": 0.5 }
            })
        );
    }

    #[test]
    fn voices_response_tolerates_missing_fields() {
        let data: VoicesResponse =
            serde_json::from_str(r#"{"voices":[{"voice_id":"a","name":"Rick"},{"voice_id":"b"}]}"#)
                .expect("parse");
        assert_eq!(data.voices.len(), 2);
        assert_eq!(data.voices[0].name.as_deref(), Some("Rick"));
        assert!(data.voices[1].name.is_none());

        let empty: VoicesResponse = serde_json::from_str("{}").expect("parse");
        assert!(empty.voices.is_empty());
    }

    #[test]
    fn client_keeps_voice_id() {
        let settings = TtsSettings {
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: "k".to_string(),
            voice_id: "voice-1".to_string(),
            model_id: "eleven_monolingual_v1".to_string(),
            voice_settings: VoiceSettings::default(),
            timeout: Duration::from_secs(1),
        };
        let client = ElevenLabsClient::new(settings).expect("client");
        assert_eq!(client.voice_id(), "voice-1");
    }
}
