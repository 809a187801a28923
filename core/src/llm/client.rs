use super::ReplyGenerator;
use crate::{OdysseaError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Configuration for LlmClient loaded from environment variables
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    pub base_url: String, // e.g., https://models.github.ai/inference
    pub model: String,    // e.g., openai/gpt-4.1-mini
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for LlmClientConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("LLM_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "https://models.github.ai/inference".to_string()),
            model: std::env::var("LLM_MODEL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "openai/gpt-4.1-mini".to_string()),
            api_key: std::env::var("GITHUB_TOKEN")
                .ok()
                .filter(|s| !s.is_empty())
                .or_else(|| std::env::var("LLM_API_KEY").ok().filter(|s| !s.is_empty())),
            request_timeout_ms: std::env::var("LLM_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30_000),
            temperature: std::env::var("LLM_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse::<f32>().ok())
                .unwrap_or(0.6),
            top_p: std::env::var("LLM_TOP_P")
                .ok()
                .and_then(|v| v.parse::<f32>().ok())
                .unwrap_or(1.0),
        }
    }
}

impl LlmClientConfig {
    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// HTTP client for OpenAI-compatible Chat Completions endpoints
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    cfg: LlmClientConfig,
}

impl LlmClient {
    pub fn new(cfg: LlmClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| OdysseaError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, cfg })
    }

    /// Send one system + user exchange and return the assistant text.
    ///
    /// - Non-2xx: `Upstream` carrying the provider's `error` object (or body)
    /// - Network failure / timeout: `Upstream` with status 502 / 504
    /// - No `choices[0].message.content`: `InvalidModelOutput`
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let chat_url = format!(
            "{}/chat/completions",
            self.cfg.base_url.trim_end_matches('/')
        );
        debug!(target: "llm_client", url = %chat_url, model = %self.cfg.model, "POST chat completions");

        let mut req = self
            .http
            .post(&chat_url)
            .header("content-type", "application/json");
        if let Some(key) = &self.cfg.api_key {
            req = req.bearer_auth(key);
        }

        let body = json!({
            "model": self.cfg.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": self.cfg.temperature,
            "top_p": self.cfg.top_p,
        });

        let t0 = Instant::now();
        let resp = req.json(&body).send().await.map_err(|e| {
            error!(target: "llm_client", error = %e, "Chat Completions request failed");
            let status = if e.is_timeout() { 504 } else { 502 };
            OdysseaError::Upstream {
                status,
                payload: json!({ "message": format!("LLM request failed: {e}") }),
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!(target: "llm_client", %status, body = %text, "Chat Completions error");
            return Err(OdysseaError::Upstream {
                status: status.as_u16(),
                payload: error_payload(&text),
            });
        }

        let val: Value = resp.json().await.map_err(|e| {
            OdysseaError::InvalidModelOutput(format!("Failed to parse Chat Completions JSON: {e}"))
        })?;
        let text = extract_text_from_chat_completions(&val).ok_or_else(|| {
            OdysseaError::InvalidModelOutput(
                "Missing choices[0].message.content in chat completions".into(),
            )
        })?;
        info!(
            target: "llm_client",
            model = val.get("model").and_then(|v| v.as_str()).unwrap_or(&self.cfg.model),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Chat Completions done"
        );
        Ok(text)
    }
}

#[async_trait]
impl ReplyGenerator for LlmClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        self.complete(system, user).await
    }
}

/// Prefer the provider's `error` object; fall back to the whole body
fn error_payload(text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(mut obj)) if obj.contains_key("error") => {
            obj.remove("error").unwrap_or_default()
        }
        Ok(v) => v,
        Err(_) => Value::String(text.to_string()),
    }
}

fn extract_text_from_chat_completions(v: &Value) -> Option<String> {
    v.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| s.to_string())
}
