//! Reply orchestration: user message → model reply lines → speech → lip-sync.
//!
//! Branches:
//! - no message: canned introduction pair
//! - no language-model credential: canned configuration warning pair
//! - otherwise: generate, parse, then render every line concurrently
//!
//! Per-line failures (synthesis, lip-sync, artifact I/O) degrade that line
//! to `audio: null, lipsync: null`. Only a failed model call or an
//! unusable model output fails the request.

use crate::canned::{self, INTRO, MISSING_API_KEY};
use crate::lipsync::LipSyncAnalyzer;
use crate::llm::{ReplyGenerator, SYSTEM_PROMPT};
use crate::reply::{parse_model_output, ChatResponse, Media, ReplyBundle, ReplyLine};
use crate::speech::SynthesisChain;
use crate::store::{ArtifactKey, ArtifactStore};
use crate::text::{is_speakable, strip_urls};
use crate::Result;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

pub struct ReplyOrchestrator {
    generator: Option<Arc<dyn ReplyGenerator>>,
    synthesis: SynthesisChain,
    lipsync: Arc<dyn LipSyncAnalyzer>,
    store: Arc<dyn ArtifactStore>,
    system_prompt: String,
}

impl ReplyOrchestrator {
    pub fn new(
        synthesis: SynthesisChain,
        lipsync: Arc<dyn LipSyncAnalyzer>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            generator: None,
            synthesis,
            lipsync,
            store,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }

    /// Without a generator every non-empty message gets the missing-key reply
    pub fn with_generator(mut self, generator: Arc<dyn ReplyGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn handle(&self, message: Option<&str>) -> Result<ChatResponse> {
        let Some(message) = message.map(str::trim).filter(|m| !m.is_empty()) else {
            debug!(target: "orchestrator", "No message; sending introduction");
            return Ok(ChatResponse {
                messages: canned::load(&INTRO, self.store.as_ref()).await,
            });
        };

        let Some(generator) = &self.generator else {
            warn!(target: "orchestrator", "No language-model credential configured");
            return Ok(ChatResponse {
                messages: canned::load(&MISSING_API_KEY, self.store.as_ref()).await,
            });
        };

        let request_id = Uuid::new_v4().simple().to_string();
        let span = info_span!("chat", request_id = %request_id);
        async move {
            let t0 = Instant::now();
            let raw = generator.generate(&self.system_prompt, message).await?;
            let lines = parse_model_output(&raw)?;
            debug!(target: "orchestrator", lines = lines.len(), "Model reply parsed");

            let messages = join_all(
                lines
                    .into_iter()
                    .enumerate()
                    .map(|(index, line)| self.render_line(&request_id, index, line)),
            )
            .await;

            info!(
                target: "orchestrator",
                lines = messages.len(),
                with_media = messages.iter().filter(|b| b.has_media()).count(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Reply ready"
            );
            Ok(ChatResponse { messages })
        }
        .instrument(span)
        .await
    }

    async fn render_line(&self, request_id: &str, index: usize, line: ReplyLine) -> ReplyBundle {
        let key = ArtifactKey::generated(request_id, index);
        let media = match self.produce_media(&key, &line.text).await {
            Ok(media) => media,
            Err(e) => {
                warn!(target: "orchestrator", index, error = %e, "Line degraded to text only");
                None
            }
        };
        if let Err(e) = self.store.release(&key).await {
            warn!(target: "orchestrator", index, error = %e, "Failed to release artifacts");
        }
        ReplyBundle::new(line, media)
    }

    async fn produce_media(&self, key: &ArtifactKey, text: &str) -> Result<Option<Media>> {
        let speech = strip_urls(text);
        if !is_speakable(&speech) {
            debug!(target: "orchestrator", key = %key, "Nothing to speak");
            return Ok(None);
        }

        let audio = self.synthesis.synthesize(&speech).await?;
        let audio_path = self.store.write_audio(key, &audio.bytes).await?;
        let timing_path = self.store.timing_path(key);

        let t0 = Instant::now();
        self.lipsync.analyze(&audio_path, &timing_path).await?;
        debug!(
            target: "lipsync",
            key = %key,
            provider = %audio.provider,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Lip sync done"
        );

        self.store.load_media(key).await.map(Some)
    }
}
