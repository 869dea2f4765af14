//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.voxrelay/config.json`) and environment.
//! The resolved text-to-speech settings are immutable once built and are passed
//! explicitly to the relay.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Text-to-speech API settings.
    #[serde(default)]
    pub tts: TtsConfig,

    /// Webhook server settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Stdin/stdout agent settings.
    #[serde(default)]
    pub agent: AgentConfig,
}

/// What a front end does when the synthesis call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Surface the error to the caller; no reply is produced.
    Abort,

    /// Keep the text reply and return it with no audio.
    Degrade,
}

/// Text-to-speech API settings as they appear in the config file.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsConfig {
    /// API base URL (default "https://api.elevenlabs.io/v1").
    #[serde(default = "default_tts_base_url")]
    pub base_url: String,

    /// API key. Overridden by ELEVENLABS_API_KEY env.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Voice used for every synthesis request. Overridden by ELEVENLABS_VOICE_ID env.
    #[serde(default)]
    pub voice_id: Option<String>,

    /// Model id sent with each request (default "eleven_monolingual_v1").
    #[serde(default = "default_model_id")]
    pub model_id: String,

    #[serde(default)]
    pub voice_settings: VoiceSettings,

    /// Request timeout in seconds, applied to every outbound call (default 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Voice tuning sent in the synthesis request body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSettings {
    #[serde(default = "default_voice_setting")]
    pub stability: f32,
    #[serde(default = "default_voice_setting")]
    pub similarity_boost: f32,
}

/// Webhook bind, port, and failure policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    /// Port for HTTP (default 8001).
    #[serde(default = "default_webhook_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0").
    #[serde(default = "default_webhook_bind")]
    pub bind: String,

    /// Default "abort": a failed synthesis fails the request.
    #[serde(default = "default_webhook_policy")]
    pub on_synthesis_failure: FailurePolicy,
}

/// Agent failure policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    /// Default "degrade": a failed synthesis yields text with null audio.
    #[serde(default = "default_agent_policy")]
    pub on_synthesis_failure: FailurePolicy,
}

fn default_tts_base_url() -> String {
    "https://api.elevenlabs.io/v1".to_string()
}

fn default_model_id() -> String {
    "eleven_monolingual_v1".to_string()
}

fn default_voice_setting() -> f32 {
    0.5
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_webhook_port() -> u16 {
    8001
}

fn default_webhook_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_webhook_policy() -> FailurePolicy {
    FailurePolicy::Abort
}

fn default_agent_policy() -> FailurePolicy {
    FailurePolicy::Degrade
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: default_tts_base_url(),
            api_key: None,
            voice_id: None,
            model_id: default_model_id(),
            voice_settings: VoiceSettings::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for TtsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtsConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("voice_id", &self.voice_id)
            .field("model_id", &self.model_id)
            .field("voice_settings", &self.voice_settings)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: default_voice_setting(),
            similarity_boost: default_voice_setting(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            port: default_webhook_port(),
            bind: default_webhook_bind(),
            on_synthesis_failure: default_webhook_policy(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            on_synthesis_failure: default_agent_policy(),
        }
    }
}

/// Resolved, immutable settings for the synthesis client.
#[derive(Clone)]
pub struct TtsSettings {
    pub base_url: String,
    pub api_key: String,
    pub voice_id: String,
    pub model_id: String,
    pub voice_settings: VoiceSettings,
    pub timeout: Duration,
}

impl fmt::Debug for TtsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtsSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("voice_id", &self.voice_id)
            .field("model_id", &self.model_id)
            .field("voice_settings", &self.voice_settings)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Resolve the API key: env ELEVENLABS_API_KEY overrides config.
pub fn resolve_api_key(config: &Config) -> Option<String> {
    non_empty_env("ELEVENLABS_API_KEY").or_else(|| non_empty(config.tts.api_key.as_ref()))
}

/// Resolve the voice id: env ELEVENLABS_VOICE_ID overrides config.
pub fn resolve_voice_id(config: &Config) -> Option<String> {
    non_empty_env("ELEVENLABS_VOICE_ID").or_else(|| non_empty(config.tts.voice_id.as_ref()))
}

/// The voice id is placed verbatim in the request path.
fn is_path_safe(segment: &str) -> bool {
    !segment
        .chars()
        .any(|c| matches!(c, '/' | '?' | '#' | '%' | '\\') || c.is_whitespace() || c.is_control())
}

impl Config {
    /// Build the synthesis settings with env overrides applied. Fails when the key or
    /// voice is missing, the voice id is not a single path segment, or the timeout is zero.
    pub fn tts_settings(&self) -> Result<TtsSettings> {
        let api_key = resolve_api_key(self).context(
            "no text-to-speech API key configured (set tts.apiKey or ELEVENLABS_API_KEY)",
        )?;
        let voice_id = resolve_voice_id(self)
            .context("no voice configured (set tts.voiceId or ELEVENLABS_VOICE_ID)")?;
        if !is_path_safe(&voice_id) {
            anyhow::bail!("invalid voice id {:?}: must be a single URL path segment", voice_id);
        }
        self.settings_with(api_key, voice_id)
    }

    /// Like [`Config::tts_settings`] but without requiring a voice id, for calls that
    /// are not voice-scoped (listing voices).
    pub fn tts_settings_without_voice(&self) -> Result<TtsSettings> {
        let api_key = resolve_api_key(self).context(
            "no text-to-speech API key configured (set tts.apiKey or ELEVENLABS_API_KEY)",
        )?;
        self.settings_with(api_key, String::new())
    }

    fn settings_with(&self, api_key: String, voice_id: String) -> Result<TtsSettings> {
        if self.tts.timeout_secs == 0 {
            anyhow::bail!("tts.timeoutSecs must be greater than zero");
        }
        Ok(TtsSettings {
            base_url: self.tts.base_url.trim().trim_end_matches('/').to_string(),
            api_key,
            voice_id,
            model_id: self.tts.model_id.clone(),
            voice_settings: self.tts.voice_settings,
            timeout: Duration::from_secs(self.tts.timeout_secs),
        })
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("VOXRELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".voxrelay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or VOXRELAY_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
