//! Sequential fallback chains for STT and rewrite providers.
//!
//! Entries are attempted strictly in order; attempt N+1 never starts before
//! attempt N's outcome is known. Only genuine errors advance the chain — and
//! an STT error that is not fallback-eligible (malformed audio) short-circuits
//! immediately, because no other provider can do better with the same input.
//! If every entry fails, the last error is surfaced.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::provider::{RewriteError, RewriteProvider, SttError, SttProvider};

// ---------------------------------------------------------------------------
// FallbackStt
// ---------------------------------------------------------------------------

/// One link in an STT fallback chain.
pub struct SttEntry {
    pub provider: Arc<dyn SttProvider>,
    /// Short name used in log lines ("deepgram", "whisper"…).
    pub label: String,
}

impl SttEntry {
    pub fn new(provider: Arc<dyn SttProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }
}

/// Tries each STT entry in declaration order until one succeeds.
pub struct FallbackStt {
    entries: Vec<SttEntry>,
}

impl FallbackStt {
    /// # Panics
    /// Panics if `entries` is empty.
    pub fn new(entries: Vec<SttEntry>) -> Self {
        assert!(!entries.is_empty(), "FallbackStt requires at least one entry");
        Self { entries }
    }
}

#[async_trait]
impl SttProvider for FallbackStt {
    async fn transcribe(&self, audio: &Path) -> Result<String, SttError> {
        let mut last_error: Option<SttError> = None;

        for (index, entry) in self.entries.iter().enumerate() {
            match entry.provider.transcribe(audio).await {
                Ok(transcript) => return Ok(transcript),
                Err(error) => {
                    if !error.is_fallback_eligible() {
                        log::warn!("{} failed: {error} — not fallback eligible", entry.label);
                        return Err(error);
                    }
                    if index < self.entries.len() - 1 {
                        log::warn!("{} failed: {error}, trying next provider", entry.label);
                    }
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SttError::Unknown("no STT providers available".into())))
    }
}

// ---------------------------------------------------------------------------
// FallbackRewrite
// ---------------------------------------------------------------------------

/// One link in a rewrite fallback chain.
///
/// Each entry pins its own model id: a secondary provider usually cannot
/// serve the primary's model namespace.
pub struct RewriteEntry {
    pub provider: Arc<dyn RewriteProvider>,
    pub model: String,
    pub label: String,
}

impl RewriteEntry {
    pub fn new(
        provider: Arc<dyn RewriteProvider>,
        model: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            label: label.into(),
        }
    }
}

/// Tries each rewrite entry in declaration order until one succeeds.
pub struct FallbackRewrite {
    entries: Vec<RewriteEntry>,
}

impl FallbackRewrite {
    /// # Panics
    /// Panics if `entries` is empty.
    pub fn new(entries: Vec<RewriteEntry>) -> Self {
        assert!(
            !entries.is_empty(),
            "FallbackRewrite requires at least one entry"
        );
        Self { entries }
    }
}

#[async_trait]
impl RewriteProvider for FallbackRewrite {
    async fn rewrite(
        &self,
        transcript: &str,
        system_prompt: &str,
        _model: &str,
    ) -> Result<String, RewriteError> {
        let mut last_error: Option<RewriteError> = None;

        for (index, entry) in self.entries.iter().enumerate() {
            match entry
                .provider
                .rewrite(transcript, system_prompt, &entry.model)
                .await
            {
                Ok(text) => return Ok(text),
                Err(error) => {
                    if index < self.entries.len() - 1 {
                        log::warn!("{} failed: {error}, trying next provider", entry.label);
                    }
                    last_error = Some(error);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| RewriteError::Unknown("all rewrite providers failed".into())))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::{ScriptedRewrite, ScriptedStt};

    fn audio() -> &'static Path {
        Path::new("/tmp/recording.wav")
    }

    #[tokio::test]
    async fn first_success_stops_the_chain() {
        let a = Arc::new(ScriptedStt::ok("first"));
        let b = Arc::new(ScriptedStt::ok("second"));
        let chain = FallbackStt::new(vec![
            SttEntry::new(Arc::clone(&a) as Arc<dyn SttProvider>, "a"),
            SttEntry::new(Arc::clone(&b) as Arc<dyn SttProvider>, "b"),
        ]);

        assert_eq!(chain.transcribe(audio()).await.unwrap(), "first");
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn eligible_error_advances_to_next_entry() {
        let a = Arc::new(ScriptedStt::err(SttError::Network("down".into())));
        let b = Arc::new(ScriptedStt::ok("recovered"));
        let chain = FallbackStt::new(vec![
            SttEntry::new(Arc::clone(&a) as Arc<dyn SttProvider>, "a"),
            SttEntry::new(Arc::clone(&b) as Arc<dyn SttProvider>, "b"),
        ]);

        assert_eq!(chain.transcribe(audio()).await.unwrap(), "recovered");
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn invalid_audio_short_circuits_without_trying_later_entries() {
        let a = Arc::new(ScriptedStt::err(SttError::InvalidAudio));
        let b = Arc::new(ScriptedStt::ok("never"));
        let chain = FallbackStt::new(vec![
            SttEntry::new(Arc::clone(&a) as Arc<dyn SttProvider>, "a"),
            SttEntry::new(Arc::clone(&b) as Arc<dyn SttProvider>, "b"),
        ]);

        let err = chain.transcribe(audio()).await.unwrap_err();
        assert_eq!(err, SttError::InvalidAudio);
        assert_eq!(b.calls(), 0, "B must never be invoked");
    }

    #[tokio::test]
    async fn all_failures_surface_the_last_error() {
        let chain = FallbackStt::new(vec![
            SttEntry::new(
                Arc::new(ScriptedStt::err(SttError::Network("a down".into()))),
                "a",
            ),
            SttEntry::new(
                Arc::new(ScriptedStt::err(SttError::Network("b down".into()))),
                "b",
            ),
        ]);

        let err = chain.transcribe(audio()).await.unwrap_err();
        assert_eq!(err, SttError::Network("b down".into()));
    }

    #[tokio::test]
    async fn rewrite_entries_use_their_own_model_ids() {
        let a = Arc::new(ScriptedRewrite::err(RewriteError::Network("503".into())));
        let b = Arc::new(ScriptedRewrite::ok("rewritten"));
        let chain = FallbackRewrite::new(vec![
            RewriteEntry::new(Arc::clone(&a) as Arc<dyn RewriteProvider>, "primary-model", "a"),
            RewriteEntry::new(Arc::clone(&b) as Arc<dyn RewriteProvider>, "backup-model", "b"),
        ]);

        let text = chain.rewrite("hi", "prompt", "requested-model").await.unwrap();
        assert_eq!(text, "rewritten");
        assert_eq!(a.last_model().as_deref(), Some("primary-model"));
        assert_eq!(b.last_model().as_deref(), Some("backup-model"));
    }

    #[test]
    #[should_panic(expected = "at least one entry")]
    fn empty_chain_is_a_construction_bug() {
        let _ = FallbackStt::new(Vec::new());
    }
}
