//! Artifact storage for audio and timing files.
//!
//! Canned assets (`intro_0`, `api_1`, ...) are read-only files shipped next
//! to the service. Generated artifacts are keyed by request id and line
//! index so concurrent requests never write to the same file.

use crate::reply::Media;
use crate::{OdysseaError, Result};
use async_trait::async_trait;
use base64::Engine;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactKey {
    /// Pre-authored asset, e.g. `intro_0`
    Canned(String),
    /// Per-request generated asset
    Generated { request_id: String, index: usize },
}

impl ArtifactKey {
    pub fn canned(name: impl Into<String>) -> Self {
        ArtifactKey::Canned(name.into())
    }

    pub fn generated(request_id: impl Into<String>, index: usize) -> Self {
        ArtifactKey::Generated {
            request_id: request_id.into(),
            index,
        }
    }

    /// File stem shared by the audio and timing files
    pub fn stem(&self) -> String {
        match self {
            ArtifactKey::Canned(name) => name.clone(),
            ArtifactKey::Generated { request_id, index } => {
                format!("message_{}_{}", request_id, index)
            }
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, ArtifactKey::Generated { .. })
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stem())
    }
}

/// Where audio and timing documents live. The lip-sync tool works on
/// files, so every store exposes real paths.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    fn audio_path(&self, key: &ArtifactKey) -> PathBuf;

    fn timing_path(&self, key: &ArtifactKey) -> PathBuf;

    async fn write_audio(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<PathBuf>;

    async fn read_audio_base64(&self, key: &ArtifactKey) -> Result<String>;

    async fn read_timing(&self, key: &ArtifactKey) -> Result<Value>;

    /// Drop generated artifacts once the response has been built
    async fn release(&self, key: &ArtifactKey) -> Result<()>;

    /// Read the audio/timing pair for `key`
    async fn load_media(&self, key: &ArtifactKey) -> Result<Media> {
        let audio_base64 = self.read_audio_base64(key).await?;
        let lipsync = self.read_timing(key).await?;
        Ok(Media {
            audio_base64,
            lipsync,
        })
    }
}

/// Flat directory store (`audios/` by default)
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
    retain_generated: bool,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            retain_generated: false,
        }
    }

    /// Keep generated files on disk instead of deleting them after use
    pub fn with_retain_generated(mut self, retain: bool) -> Self {
        self.retain_generated = retain;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if it does not exist yet
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    fn audio_path(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(format!("{}.wav", key.stem()))
    }

    fn timing_path(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(format!("{}.json", key.stem()))
    }

    async fn write_audio(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.audio_path(key);
        tokio::fs::write(&path, bytes).await?;
        debug!(target: "store", path = %path.display(), bytes = bytes.len(), "Wrote audio");
        Ok(path)
    }

    async fn read_audio_base64(&self, key: &ArtifactKey) -> Result<String> {
        let data = tokio::fs::read(self.audio_path(key)).await?;
        Ok(base64::engine::general_purpose::STANDARD.encode(data))
    }

    async fn read_timing(&self, key: &ArtifactKey) -> Result<Value> {
        let path = self.timing_path(key);
        let data = tokio::fs::read_to_string(&path).await?;
        serde_json::from_str(&data).map_err(|e| {
            OdysseaError::LipSync(format!(
                "timing document {} is not valid JSON: {}",
                path.display(),
                e
            ))
        })
    }

    async fn release(&self, key: &ArtifactKey) -> Result<()> {
        if !key.is_generated() || self.retain_generated {
            return Ok(());
        }
        for path in [self.audio_path(key), self.timing_path(key)] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(target: "store", path = %path.display(), error = %e, "Failed to remove artifact");
                }
            }
        }
        Ok(())
    }
}
