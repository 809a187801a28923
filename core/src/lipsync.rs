//! Phoneme-timing ("lip-sync") extraction capability.

use crate::Result;
use async_trait::async_trait;
use std::path::Path;

/// Produces a JSON timing document for an audio file.
///
/// Implementations write the document to `output` and fail with
/// [`crate::OdysseaError::LipSync`] when no document was produced.
#[async_trait]
pub trait LipSyncAnalyzer: Send + Sync {
    async fn analyze(&self, audio: &Path, output: &Path) -> Result<()>;
}
