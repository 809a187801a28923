use std::fs;
use std::path::{Path, PathBuf};

use odyssea_audio::{ElevenLabsConfig, RhubarbConfig, SystemVoiceConfig};
use odyssea_core::LlmClientConfig;

/// Everything the server needs to wire the reply pipeline
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding canned assets and transient per-request artifacts
    pub audio_dir: PathBuf,
    /// Keep generated `message_*` artifacts after responding
    pub retain_artifacts: bool,
    pub llm: LlmClientConfig,
    pub elevenlabs: ElevenLabsConfig,
    pub system_voice: SystemVoiceConfig,
    pub rhubarb: RhubarbConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        // Component defaults already consider env vars
        Self {
            host: std::env::var("HOST")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(3000),
            audio_dir: std::env::var("AUDIO_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("audios")),
            retain_artifacts: std::env::var("RETAIN_ARTIFACTS")
                .ok()
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            llm: LlmClientConfig::default(),
            elevenlabs: ElevenLabsConfig::default(),
            system_voice: SystemVoiceConfig::default(),
            rhubarb: RhubarbConfig::default(),
        }
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl ServerConfig {
    /// Load configuration from a TOML file (path via ODYSSEA_CONFIG or ./odyssea.toml),
    /// overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let path = std::env::var("ODYSSEA_CONFIG").unwrap_or_else(|_| "odyssea.toml".into());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(p: &Path) -> Self {
        let default = Self::default();
        if !p.exists() {
            tracing::info!(target: "server", path = %p.display(), "No TOML config found; using defaults/env");
            return default;
        }
        match fs::read_to_string(p) {
            Ok(s) => match toml::from_str::<ServerToml>(&s) {
                Ok(t) => t.overlay(default),
                Err(e) => {
                    tracing::warn!(target: "server", error = %e, "Failed to parse TOML; using defaults");
                    default
                }
            },
            Err(e) => {
                tracing::warn!(target: "server", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// TOML overlay. Credentials stay in the environment.

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct ServerToml {
    pub server: Option<ListenToml>,
    pub llm: Option<LlmToml>,
    pub elevenlabs: Option<ElevenLabsToml>,
    pub system_voice: Option<SystemVoiceToml>,
    pub rhubarb: Option<RhubarbToml>,
}

impl ServerToml {
    fn overlay(self, mut base: ServerConfig) -> ServerConfig {
        if let Some(s) = self.server {
            s.apply(&mut base);
        }
        if let Some(l) = self.llm {
            l.apply(&mut base.llm);
        }
        if let Some(e) = self.elevenlabs {
            e.apply(&mut base.elevenlabs);
        }
        if let Some(v) = self.system_voice {
            v.apply(&mut base.system_voice);
        }
        if let Some(r) = self.rhubarb {
            r.apply(&mut base.rhubarb);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct ListenToml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub audio_dir: Option<PathBuf>,
    pub retain_artifacts: Option<bool>,
}
impl ListenToml {
    fn apply(self, c: &mut ServerConfig) {
        if let Some(v) = self.host {
            c.host = v;
        }
        if let Some(v) = self.port {
            c.port = v;
        }
        if let Some(v) = self.audio_dir {
            c.audio_dir = v;
        }
        if let Some(v) = self.retain_artifacts {
            c.retain_artifacts = v;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct LlmToml {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}
impl LlmToml {
    fn apply(self, l: &mut LlmClientConfig) {
        if let Some(v) = self.base_url {
            l.base_url = v;
        }
        if let Some(v) = self.model {
            l.model = v;
        }
        if let Some(v) = self.request_timeout_ms {
            l.request_timeout_ms = v;
        }
        if let Some(v) = self.temperature {
            l.temperature = v.clamp(0.0, 2.0);
        }
        if let Some(v) = self.top_p {
            l.top_p = v.clamp(0.0, 1.0);
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct ElevenLabsToml {
    pub voice_id: Option<String>,
    pub model_id: Option<String>,
    pub base_url: Option<String>,
    pub sample_rate: Option<u32>,
    pub timeout_ms: Option<u64>,
}
impl ElevenLabsToml {
    fn apply(self, e: &mut ElevenLabsConfig) {
        if let Some(v) = self.voice_id {
            e.voice_id = v;
        }
        if let Some(v) = self.model_id {
            e.model_id = v;
        }
        if let Some(v) = self.base_url {
            e.base_url = v;
        }
        if let Some(v) = self.sample_rate {
            e.sample_rate = v;
        }
        if let Some(v) = self.timeout_ms {
            e.timeout_ms = v;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct SystemVoiceToml {
    pub voice: Option<String>,
    pub rate: Option<f32>,
    pub timeout_ms: Option<u64>,
    pub piper_bin: Option<PathBuf>,
    pub piper_voice: Option<PathBuf>,
    pub piper_voice_dir: Option<PathBuf>,
    pub espeak_bin: Option<PathBuf>,
}
impl SystemVoiceToml {
    fn apply(self, s: &mut SystemVoiceConfig) {
        if let Some(v) = self.voice {
            s.voice = Some(v);
        }
        if let Some(v) = self.rate {
            s.rate = v.clamp(0.5, 2.0);
        }
        if let Some(v) = self.timeout_ms {
            s.timeout_ms = v;
        }
        if let Some(v) = self.piper_bin {
            s.piper_bin = Some(v);
        }
        if let Some(v) = self.piper_voice {
            s.piper_voice = Some(v);
        }
        if let Some(v) = self.piper_voice_dir {
            s.piper_voice_dir = Some(v);
        }
        if let Some(v) = self.espeak_bin {
            s.espeak_bin = Some(v);
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct RhubarbToml {
    pub bin: Option<PathBuf>,
    pub recognizer: Option<String>,
    pub timeout_ms: Option<u64>,
}
impl RhubarbToml {
    fn apply(self, r: &mut RhubarbConfig) {
        if let Some(v) = self.bin {
            r.bin = v;
        }
        if let Some(v) = self.recognizer {
            r.recognizer = v;
        }
        if let Some(v) = self.timeout_ms {
            r.timeout_ms = v;
        }
    }
}
