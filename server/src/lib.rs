//! Odyssea HTTP surface
//!
//! - `GET /`: liveness text
//! - `POST /chat`: `{ "message"?: string }` → `{ messages: ReplyBundle[] }`,
//!   400 when the body is not JSON

pub mod config;

pub use config::ServerConfig;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use odyssea_audio::{ElevenLabsSynthesizer, RhubarbLipSync, SystemVoiceSynthesizer};
use odyssea_core::{
    FsArtifactStore, LlmClient, OdysseaError, ReplyOrchestrator, Result, SpeechSynthesizer,
    SynthesisChain,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Event targets used across the workspace
pub const LOG_TARGETS: [&str; 6] = ["orchestrator", "llm_client", "tts", "lipsync", "store", "server"];

pub const DEFAULT_LOG_FILTER: &str =
    "info,orchestrator=info,llm_client=info,tts=info,lipsync=info,store=info,server=info,tower_http=info";

/// `RUST_LOG`-style directives name event targets (`orchestrator=debug`),
/// not crate paths. Falls back to [`DEFAULT_LOG_FILTER`] when unset or invalid.
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ReplyOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: ReplyOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// Build the axum Router with the given state (used by main and tests).
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/chat", post(chat_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn index_handler() -> &'static str {
    "Hello World!"
}

/// Parse the `/chat` body.
///
/// An empty body or one without a usable `message` means "no message".
/// A body that is not JSON is rejected. A non-string `message` that is
/// not empty, `false`, `0` or `null` is passed to the model as its JSON text.
fn chat_message(body: &[u8]) -> std::result::Result<Option<String>, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let value: Value = serde_json::from_slice(body)?;
    let message = match value.get("message") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
        Some(other) => Some(other.to_string()),
    };
    Ok(message)
}

async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let message = match chat_message(&body) {
        Ok(m) => m,
        Err(e) => {
            warn!(target: "server", error = %e, "Rejected malformed /chat body");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": { "code": "invalid_request", "message": e.to_string() }
                })),
            )
                .into_response();
        }
    };
    match state.orchestrator.handle(message.as_deref()).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// Maps a failed request onto a status code and JSON error body
pub struct ApiError(pub OdysseaError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            OdysseaError::Upstream { status, payload } => {
                warn!(target: "server", upstream_status = status, "Model request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": payload })),
                )
                    .into_response()
            }
            OdysseaError::InvalidModelOutput(message) => {
                warn!(target: "server", error = %message, "Unusable model output");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({
                        "error": { "code": "invalid_model_output", "message": message }
                    })),
                )
                    .into_response()
            }
            other => {
                error!(target: "server", error = %other, "Chat request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": { "code": "internal", "message": other.to_string() }
                    })),
                )
                    .into_response()
            }
        }
    }
}

/// Wire the production pipeline from configuration.
///
/// ElevenLabs is the primary voice when its key is set, followed by the
/// local system voice when an engine is installed. Without an LLM
/// credential the orchestrator answers with the canned warning pair.
pub async fn build_orchestrator(cfg: &ServerConfig) -> Result<ReplyOrchestrator> {
    let store = FsArtifactStore::new(&cfg.audio_dir).with_retain_generated(cfg.retain_artifacts);
    store.ensure_root().await?;

    let mut providers: Vec<Arc<dyn SpeechSynthesizer>> = Vec::new();
    if cfg.elevenlabs.api_key.is_some() {
        providers.push(Arc::new(ElevenLabsSynthesizer::new(cfg.elevenlabs.clone())?));
    } else {
        info!(target: "server", "ELEVEN_LABS_API_KEY not set; primary voice disabled");
    }
    let system_voice = SystemVoiceSynthesizer::new(cfg.system_voice.clone());
    if system_voice.engine().is_some() {
        providers.push(Arc::new(system_voice));
    }
    let synthesis = SynthesisChain::new(providers);
    if synthesis.is_empty() {
        warn!(target: "server", "No speech providers available; replies will be text only");
    } else {
        info!(target: "server", providers = ?synthesis.provider_names(), "Speech providers ready");
    }

    let lipsync = Arc::new(RhubarbLipSync::new(cfg.rhubarb.clone()));
    let mut orchestrator = ReplyOrchestrator::new(synthesis, lipsync, Arc::new(store));

    if cfg.llm.has_credential() {
        let client = LlmClient::new(cfg.llm.clone())?;
        info!(target: "server", model = %cfg.llm.model, base_url = %cfg.llm.base_url, "Language model ready");
        orchestrator = orchestrator.with_generator(Arc::new(client));
    } else {
        warn!(target: "server", "GITHUB_TOKEN not set; /chat will answer with the API key reminder");
    }
    Ok(orchestrator)
}

/// Bind and serve until Ctrl-C
pub async fn serve(cfg: ServerConfig) -> Result<()> {
    let orchestrator = build_orchestrator(&cfg).await?;
    let app = build_app(AppState::new(orchestrator));

    let addr = cfg.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(target: "server", url = %format!("http://{}", addr), "Odyssea listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!(target: "server", "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(target: "server", error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target: "server", "Shutdown requested");
}
