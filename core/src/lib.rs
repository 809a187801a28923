// Odyssea Core Library
// Turns a user message into avatar reply bundles: text, speech, lip-sync

pub mod canned;
pub mod lipsync;
pub mod llm;
pub mod orchestrator;
pub mod reply;
pub mod speech;
pub mod store;
pub mod text;

// Export core types
pub use lipsync::LipSyncAnalyzer;
pub use llm::{LlmClient, LlmClientConfig, ReplyGenerator};
pub use orchestrator::ReplyOrchestrator;
pub use reply::{Animation, ChatResponse, FacialExpression, Media, ReplyBundle, ReplyLine};
pub use speech::{SpeechSynthesizer, SynthesisChain, SynthesizedAudio};
pub use store::{ArtifactKey, ArtifactStore, FsArtifactStore};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OdysseaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream provider error (status {status}): {payload}")]
    Upstream {
        status: u16,
        payload: serde_json::Value,
    },

    #[error("Invalid model output: {0}")]
    InvalidModelOutput(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Lip-sync error: {0}")]
    LipSync(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OdysseaError>;
