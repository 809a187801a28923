//! Local system voice (fallback provider)
//!
//! Synthesizes speech with a local CLI engine:
//! - Prefer Piper (higher quality, requires voice model)
//! - Fallback to espeak-ng / espeak (widely available)
//! - If neither is present every call fails, which nulls the line's media
//!
//! Env overrides:
//! - PIPER_BIN, PIPER_VOICE, PIPER_VOICE_DIR
//! - ESPEAK_BIN
//! - TTS_VOICE, TTS_RATE, TTS_TIMEOUT_MS, TTS_TEMP_DIR

use crate::utils::{get_from_env_or_path, get_from_path};
use async_trait::async_trait;
use odyssea_core::{OdysseaError, Result, SpeechSynthesizer};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct SystemVoiceConfig {
    pub temp_dir: PathBuf,
    pub timeout_ms: u64,
    /// Piper voice model name/path or espeak voice code
    pub voice: Option<String>,
    /// Clamped to 0.5..=2.0; 1.0 is the engine's normal speed
    pub rate: f32,
    pub piper_bin: Option<PathBuf>,
    pub piper_voice: Option<PathBuf>,
    pub piper_voice_dir: Option<PathBuf>,
    pub espeak_bin: Option<PathBuf>,
}

impl Default for SystemVoiceConfig {
    fn default() -> Self {
        let temp_dir = std::env::var("TTS_TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir());
        let timeout_ms = std::env::var("TTS_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(20_000);
        let voice = std::env::var("TTS_VOICE").ok().filter(|s| !s.is_empty());
        let rate = std::env::var("TTS_RATE")
            .ok()
            .and_then(|s| s.parse::<f32>().ok())
            .unwrap_or(1.0);

        let piper_bin = get_from_env_or_path("PIPER_BIN", "piper");
        let piper_voice = std::env::var("PIPER_VOICE").ok().map(PathBuf::from);
        let piper_voice_dir = std::env::var("PIPER_VOICE_DIR").ok().map(PathBuf::from);
        let espeak_bin =
            get_from_env_or_path("ESPEAK_BIN", "espeak-ng").or_else(|| get_from_path("espeak"));

        Self {
            temp_dir,
            timeout_ms,
            voice,
            rate,
            piper_bin,
            piper_voice,
            piper_voice_dir,
            espeak_bin,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoiceEngine {
    Piper { bin: PathBuf, model: PathBuf },
    Espeak { bin: PathBuf },
}

impl VoiceEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceEngine::Piper { .. } => "piper",
            VoiceEngine::Espeak { .. } => "espeak-ng",
        }
    }
}

/// Piper needs both a binary and a voice model; otherwise use espeak
pub fn select_engine(cfg: &SystemVoiceConfig) -> Option<VoiceEngine> {
    if let Some(bin) = &cfg.piper_bin {
        match resolve_piper_voice_path(cfg) {
            Some(model) => {
                return Some(VoiceEngine::Piper {
                    bin: bin.clone(),
                    model,
                })
            }
            None => {
                debug!(target: "tts", "Piper found but no voice model; skipping");
            }
        }
    }
    cfg.espeak_bin
        .as_ref()
        .map(|bin| VoiceEngine::Espeak { bin: bin.clone() })
}

fn resolve_piper_voice_path(cfg: &SystemVoiceConfig) -> Option<PathBuf> {
    if let Some(v) = &cfg.piper_voice {
        return Some(v.clone());
    }
    let voice = cfg.voice.as_deref().filter(|v| !v.is_empty())?;
    let vh = PathBuf::from(voice);
    if vh.exists() {
        return Some(vh);
    }
    if let Some(dir) = &cfg.piper_voice_dir {
        let candidate = dir.join(voice);
        if candidate.exists() {
            return Some(candidate);
        }
        for ext in ["onnx", "onnx.gz"].iter() {
            let c = dir.join(format!("{}.{}", voice, ext));
            if c.exists() {
                return Some(c);
            }
        }
    }
    None
}

pub struct SystemVoiceSynthesizer {
    cfg: SystemVoiceConfig,
    engine: Option<VoiceEngine>,
}

impl SystemVoiceSynthesizer {
    pub fn new(cfg: SystemVoiceConfig) -> Self {
        let engine = select_engine(&cfg);
        // Log detected engine once
        match &engine {
            Some(VoiceEngine::Piper { bin, model }) => {
                info!(target: "tts", bin = ?bin, model = ?model, "Using Piper for system voice")
            }
            Some(VoiceEngine::Espeak { bin }) => {
                info!(target: "tts", bin = ?bin, "Using espeak-ng for system voice")
            }
            None => warn!(
                target: "tts",
                "No TTS engine detected (Piper/espeak-ng missing); system voice disabled"
            ),
        }
        Self { cfg, engine }
    }

    pub fn engine(&self) -> Option<&VoiceEngine> {
        self.engine.as_ref()
    }

    /// Both engines read the text from stdin, so it is never parsed as an option
    fn command(&self, engine: &VoiceEngine, out_wav: &Path) -> Command {
        let rate = self.cfg.rate.clamp(0.5, 2.0);
        match engine {
            VoiceEngine::Piper { bin, model } => {
                let mut cmd = Command::new(bin);
                cmd.arg("-m").arg(model);
                cmd.arg("-f").arg(out_wav);
                let length_scale = (1.0f32 / rate).clamp(0.5, 2.0);
                cmd.arg("--length_scale")
                    .arg(format!("{:.2}", length_scale));
                cmd.stdin(Stdio::piped());
                cmd
            }
            VoiceEngine::Espeak { bin } => {
                let mut cmd = Command::new(bin);
                let wpm = (160.0 * rate).round().clamp(80.0, 450.0) as i32;
                if let Some(voice) = self.cfg.voice.as_deref().filter(|v| !v.is_empty()) {
                    cmd.arg("-v").arg(voice);
                }
                cmd.arg("-s").arg(wpm.to_string());
                cmd.arg("-w").arg(out_wav);
                cmd.arg("--stdin");
                cmd.stdin(Stdio::piped());
                cmd
            }
        }
    }

    async fn run(&self, engine: &VoiceEngine, text: &str, out_wav: &Path) -> Result<()> {
        let mut cmd = self.command(engine, out_wav);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        debug!(target: "tts", command = ?cmd, "Running {}", engine.as_str());
        let mut child = cmd.spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            // An engine that exits early closes the pipe; its exit status decides
            match stdin.write_all(text.as_bytes()).await {
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e.into()),
                _ => {}
            }
            // Both engines read until EOF
            drop(stdin);
        }
        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(OdysseaError::Synthesis(format!(
                "{} failed: {}",
                engine.as_str(),
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SpeechSynthesizer for SystemVoiceSynthesizer {
    fn name(&self) -> &str {
        self.engine.as_ref().map(|e| e.as_str()).unwrap_or("system")
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let engine = self.engine.as_ref().ok_or_else(|| {
            OdysseaError::Synthesis("no local TTS engine available (Piper/espeak-ng)".into())
        })?;

        let wav = tempfile::Builder::new()
            .prefix("tts_")
            .suffix(".wav")
            .tempfile_in(&self.cfg.temp_dir)?;
        let wav_path = wav.path().to_path_buf();

        match timeout(
            Duration::from_millis(self.cfg.timeout_ms),
            self.run(engine, text, &wav_path),
        )
        .await
        {
            Ok(res) => res?,
            Err(_) => {
                return Err(OdysseaError::Synthesis(format!(
                    "{} timed out after {}ms",
                    engine.as_str(),
                    self.cfg.timeout_ms
                )))
            }
        }

        let bytes = tokio::fs::read(&wav_path).await?;
        if bytes.is_empty() {
            return Err(OdysseaError::Synthesis(format!(
                "{} produced no audio",
                engine.as_str()
            )));
        }
        Ok(bytes)
    }
}
