//! Deadline wrapper for STT providers.
//!
//! [`TimeoutStt`] races the wrapped call against a `tokio::time::sleep`.
//! Whichever branch finishes first wins and the loser is dropped, which
//! cancels it — the in-flight transcription future is not left running.
//!
//! A computed budget of zero is a configuration bug, not "no timeout": the
//! call fails with an explicit error instead of silently racing nothing.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::provider::{SttError, SttProvider};

// ---------------------------------------------------------------------------
// TimeoutStt
// ---------------------------------------------------------------------------

enum Budget {
    /// Same deadline for every file.
    Fixed(Duration),
    /// `base + size_mb * per_mb`, so long recordings get proportionally more
    /// upload + inference time.
    Scaled { base: Duration, per_mb: Duration },
}

/// Wraps one provider with a per-call deadline.
pub struct TimeoutStt {
    provider: Arc<dyn SttProvider>,
    budget: Budget,
}

impl TimeoutStt {
    /// Fixed deadline for every call.
    pub fn new(provider: Arc<dyn SttProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            budget: Budget::Fixed(timeout),
        }
    }

    /// Deadline that scales with the audio file's size on disk.
    pub fn scaled(provider: Arc<dyn SttProvider>, base: Duration, per_mb: Duration) -> Self {
        Self {
            provider,
            budget: Budget::Scaled { base, per_mb },
        }
    }

    fn budget_for(&self, audio: &Path) -> Duration {
        match &self.budget {
            Budget::Fixed(duration) => *duration,
            Budget::Scaled { base, per_mb } => {
                let size_bytes = std::fs::metadata(audio).map(|m| m.len()).unwrap_or(0);
                let size_mb = size_bytes as f64 / 1_048_576.0;
                let extra = per_mb.as_secs_f64() * size_mb;
                base.saturating_add(Duration::from_secs_f64(extra.max(0.0)))
            }
        }
    }
}

#[async_trait]
impl SttProvider for TimeoutStt {
    async fn transcribe(&self, audio: &Path) -> Result<String, SttError> {
        let budget = self.budget_for(audio);
        if budget.is_zero() {
            return Err(SttError::Unknown(
                "invalid STT timeout: zero duration".into(),
            ));
        }

        tokio::select! {
            result = self.provider.transcribe(audio) => result,
            _ = tokio::time::sleep(budget) => {
                Err(SttError::Network(format!(
                    "timed out after {}s",
                    budget.as_secs()
                )))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
