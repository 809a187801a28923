//! Rhubarb Lip Sync wrapper
//!
//! Runs `rhubarb -f json -o <timing.json> <audio.wav> -r <recognizer>` and
//! checks that the timing document was written.
//!
//! Env overrides:
//! - RHUBARB_BIN (default: `rhubarb` on PATH, else `bin/rhubarb`)
//! - RHUBARB_RECOGNIZER (default: phonetic)
//! - RHUBARB_TIMEOUT_MS (default: 60000)

use crate::utils::get_from_env_or_path;
use async_trait::async_trait;
use odyssea_core::{LipSyncAnalyzer, OdysseaError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct RhubarbConfig {
    pub bin: PathBuf,
    pub recognizer: String,
    pub timeout_ms: u64,
}

impl Default for RhubarbConfig {
    fn default() -> Self {
        let bin = get_from_env_or_path("RHUBARB_BIN", "rhubarb")
            .or_else(|| std::env::var("RHUBARB_BIN").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("bin/rhubarb"));
        Self {
            bin,
            recognizer: std::env::var("RHUBARB_RECOGNIZER")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "phonetic".to_string()),
            timeout_ms: std::env::var("RHUBARB_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60_000),
        }
    }
}

/// Argument list for one analysis run
pub fn build_args(audio: &Path, output: &Path, recognizer: &str) -> Vec<OsString> {
    vec![
        "-f".into(),
        "json".into(),
        "-o".into(),
        output.as_os_str().to_owned(),
        audio.as_os_str().to_owned(),
        "-r".into(),
        recognizer.into(),
    ]
}

pub struct RhubarbLipSync {
    cfg: RhubarbConfig,
}

impl RhubarbLipSync {
    pub fn new(cfg: RhubarbConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl LipSyncAnalyzer for RhubarbLipSync {
    async fn analyze(&self, audio: &Path, output: &Path) -> Result<()> {
        let started = Instant::now();
        let mut cmd = Command::new(&self.cfg.bin);
        cmd.args(build_args(audio, output, &self.cfg.recognizer))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(target: "lipsync", bin = ?self.cfg.bin, audio = %audio.display(), "Starting rhubarb");
        let child = cmd.spawn().map_err(|e| {
            OdysseaError::LipSync(format!(
                "failed to start {}: {e}",
                self.cfg.bin.display()
            ))
        })?;

        let output_res = match timeout(
            Duration::from_millis(self.cfg.timeout_ms),
            child.wait_with_output(),
        )
        .await
        {
            Ok(res) => res?,
            Err(_) => {
                return Err(OdysseaError::LipSync(format!(
                    "rhubarb timed out after {}ms",
                    self.cfg.timeout_ms
                )))
            }
        };

        if !output_res.status.success() {
            return Err(OdysseaError::LipSync(format!(
                "rhubarb exited with {}: {}",
                output_res.status,
                String::from_utf8_lossy(&output_res.stderr).trim()
            )));
        }
        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(OdysseaError::LipSync(format!(
                "rhubarb produced no timing file at {}",
                output.display()
            )));
        }

        info!(
            target: "lipsync",
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Lip sync done"
        );
        Ok(())
    }
}
