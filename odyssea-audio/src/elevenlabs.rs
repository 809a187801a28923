//! ElevenLabs text-to-speech provider (primary voice)
//!
//! Requests raw 16-bit PCM (`output_format=pcm_<rate>`) and wraps it into a
//! WAV container so the lip-sync tool can read it directly.
//!
//! Env overrides:
//! - ELEVEN_LABS_API_KEY (required for the provider to be enabled)
//! - ELEVEN_LABS_VOICE_ID, ELEVEN_LABS_MODEL_ID, ELEVEN_LABS_BASE_URL
//! - ELEVEN_LABS_SAMPLE_RATE, ELEVEN_LABS_TIMEOUT_MS

use crate::utils::{looks_like_wav, pcm16_to_wav};
use async_trait::async_trait;
use odyssea_core::{OdysseaError, Result, SpeechSynthesizer};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub api_key: Option<String>,
    pub voice_id: String,
    pub model_id: String,
    pub base_url: String,
    /// One of 16000, 22050, 24000, 44100
    pub sample_rate: u32,
    pub timeout_ms: u64,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("ELEVEN_LABS_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            voice_id: std::env::var("ELEVEN_LABS_VOICE_ID")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "21m00Tcm4TlvDq8ikWAM".to_string()),
            model_id: std::env::var("ELEVEN_LABS_MODEL_ID")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "eleven_multilingual_v2".to_string()),
            base_url: std::env::var("ELEVEN_LABS_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "https://api.elevenlabs.io/v1".to_string()),
            sample_rate: std::env::var("ELEVEN_LABS_SAMPLE_RATE")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(16_000),
            timeout_ms: std::env::var("ELEVEN_LABS_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(20_000),
        }
    }
}

pub struct ElevenLabsSynthesizer {
    http: Client,
    cfg: ElevenLabsConfig,
    api_key: String,
}

impl ElevenLabsSynthesizer {
    /// Fails with `Config` when no API key is set
    pub fn new(cfg: ElevenLabsConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| OdysseaError::Config("ELEVEN_LABS_API_KEY is not set".into()))?;
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| OdysseaError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, cfg, api_key })
    }

    /// `None` when the provider is not configured
    pub fn from_env() -> Result<Option<Self>> {
        let cfg = ElevenLabsConfig::default();
        if cfg.api_key.is_none() {
            return Ok(None);
        }
        Self::new(cfg).map(Some)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/text-to-speech/{}?output_format=pcm_{}",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.voice_id,
            self.cfg.sample_rate
        )
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let url = self.endpoint();
        debug!(target: "tts", voice = %self.cfg.voice_id, "POST ElevenLabs text-to-speech");

        let resp = self
            .http
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&json!({
                "text": text,
                "model_id": self.cfg.model_id,
            }))
            .send()
            .await
            .map_err(|e| OdysseaError::Synthesis(format!("ElevenLabs request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(target: "tts", %status, body = %body, "ElevenLabs error");
            return Err(OdysseaError::Synthesis(format!(
                "ElevenLabs error: status={} body={}",
                status, body
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| OdysseaError::Synthesis(format!("ElevenLabs body read failed: {e}")))?;
        if bytes.is_empty() {
            return Err(OdysseaError::Synthesis("ElevenLabs returned no audio".into()));
        }
        if looks_like_wav(&bytes) {
            return Ok(bytes.to_vec());
        }
        pcm16_to_wav(&bytes, self.cfg.sample_rate)
            .map_err(|e| OdysseaError::Synthesis(format!("Failed to wrap PCM as WAV: {e}")))
    }
}
