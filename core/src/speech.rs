//! Speech synthesis capability and provider fallback chain.

use crate::{OdysseaError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A speech provider: text in, WAV bytes out
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Short provider name used in logs (e.g. "elevenlabs", "espeak-ng")
    fn name(&self) -> &str;

    /// Synthesize `text` and return a complete WAV file
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Audio produced by the first provider in the chain that succeeded
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub provider: String,
    pub bytes: Vec<u8>,
}

/// Ordered list of providers tried one after another until one succeeds
#[derive(Clone, Default)]
pub struct SynthesisChain {
    providers: Vec<Arc<dyn SpeechSynthesizer>>,
}

impl SynthesisChain {
    pub fn new(providers: Vec<Arc<dyn SpeechSynthesizer>>) -> Self {
        Self { providers }
    }

    pub fn push(mut self, provider: Arc<dyn SpeechSynthesizer>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        let mut failures = Vec::new();
        for provider in &self.providers {
            let t0 = Instant::now();
            debug!(target: "tts", provider = provider.name(), "Synthesizing");
            match provider.synthesize(text).await {
                Ok(bytes) if !bytes.is_empty() => {
                    info!(
                        target: "tts",
                        provider = provider.name(),
                        bytes = bytes.len(),
                        elapsed_ms = t0.elapsed().as_millis() as u64,
                        "Synthesis done"
                    );
                    return Ok(SynthesizedAudio {
                        provider: provider.name().to_string(),
                        bytes,
                    });
                }
                Ok(_) => {
                    warn!(target: "tts", provider = provider.name(), "Provider returned no audio; trying next");
                    failures.push(format!("{}: empty audio", provider.name()));
                }
                Err(e) => {
                    warn!(target: "tts", provider = provider.name(), error = %e, "Provider failed; trying next");
                    failures.push(format!("{}: {}", provider.name(), e));
                }
            }
        }
        if failures.is_empty() {
            return Err(OdysseaError::Synthesis(
                "no speech providers configured".into(),
            ));
        }
        Err(OdysseaError::Synthesis(failures.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        name: &'static str,
        result: Option<Vec<u8>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(name: &'static str, bytes: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                name,
                result: Some(bytes.to_vec()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                result: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .ok_or_else(|| OdysseaError::Synthesis(format!("{} down", self.name)))
        }
    }

    #[tokio::test]
    async fn first_success_wins() {
        let primary = Scripted::ok("primary", b"RIFF1");
        let fallback = Scripted::ok("fallback", b"RIFF2");
        let providers: Vec<Arc<dyn SpeechSynthesizer>> = vec![primary.clone() as Arc<dyn SpeechSynthesizer>, fallback.clone()];
        let chain = SynthesisChain::new(providers);

        let out = chain.synthesize("hi").await.unwrap();
        assert_eq!(out.provider, "primary");
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn falls_back_on_failure() {
        let primary = Scripted::failing("primary");
        let fallback = Scripted::ok("fallback", b"RIFF2");
        let chain = SynthesisChain::default()
            .push(primary.clone())
            .push(fallback.clone());

        let out = chain.synthesize("hi").await.unwrap();
        assert_eq!(out.provider, "fallback");
        assert_eq!(out.bytes, b"RIFF2");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_audio_counts_as_failure() {
        let chain = SynthesisChain::default().push(Scripted::ok("silent", b""));
        let err = chain.synthesize("hi").await.unwrap_err();
        assert!(err.to_string().contains("silent: empty audio"));
    }

    #[tokio::test]
    async fn all_failing_reports_every_provider() {
        let chain = SynthesisChain::default()
            .push(Scripted::failing("a"))
            .push(Scripted::failing("b"));
        match chain.synthesize("hi").await {
            Err(OdysseaError::Synthesis(msg)) => {
                assert!(msg.contains("a down"));
                assert!(msg.contains("b down"));
            }
            other => panic!("expected synthesis error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_chain_fails() {
        let chain = SynthesisChain::default();
        assert!(chain.is_empty());
        assert!(chain.synthesize("hi").await.is_err());
    }
}
