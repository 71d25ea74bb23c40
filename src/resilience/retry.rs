//! Throttle-aware retry wrapper for STT providers.
//!
//! [`RetryingStt`] retries only [`SttError::Throttled`] — the one failure a
//! second attempt against the *same* provider can fix. Every other error
//! propagates immediately; provider rotation belongs to the fallback and
//! hedged combinators, not here.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::provider::{SttError, SttProvider};

/// Callback invoked before each retry sleep: `(attempt, max_retries, delay)`.
/// Attempt numbers start at 1.
pub type RetryCallback = Arc<dyn Fn(u32, u32, Duration) + Send + Sync>;

// ---------------------------------------------------------------------------
// RetryingStt
// ---------------------------------------------------------------------------

/// Wraps one provider with exponential backoff on throttling.
///
/// Backoff for attempt `n` (1-based) is `base_delay * 2^(n-1)` plus a uniform
/// jitter in `0..base_delay`, so simultaneous callers do not re-throttle the
/// provider in lockstep.
pub struct RetryingStt {
    provider: Arc<dyn SttProvider>,
    max_retries: u32,
    base_delay: Duration,
    name: String,
    on_retry: Option<RetryCallback>,
}

impl RetryingStt {
    pub fn new(provider: Arc<dyn SttProvider>, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            provider,
            max_retries,
            base_delay,
            name: "STT".to_string(),
            on_retry: None,
        }
    }

    /// Name used in log lines when attempts are reported.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_retry_callback(mut self, callback: RetryCallback) -> Self {
        self.on_retry = Some(callback);
        self
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self.base_delay.saturating_mul(1 << exponent);
        let jitter = rand::thread_rng().gen_range(Duration::ZERO..=self.base_delay);
        backoff.saturating_add(jitter)
    }
}

#[async_trait]
impl SttProvider for RetryingStt {
    async fn transcribe(&self, audio: &Path) -> Result<String, SttError> {
        let mut attempt: u32 = 0;
        loop {
            match self.provider.transcribe(audio).await {
                Ok(transcript) => return Ok(transcript),
                Err(error) => {
                    if !error.is_retryable() || attempt >= self.max_retries {
                        if attempt > 0 {
                            log::warn!(
                                "{}: failed after {attempt} retries — {error}",
                                self.name
                            );
                        }
                        return Err(error);
                    }

                    attempt += 1;
                    let delay = self.delay_for_attempt(attempt);
                    log::info!(
                        "{}: retry {attempt}/{} in {delay:?} — {error}",
                        self.name,
                        self.max_retries
                    );
                    if let Some(on_retry) = &self.on_retry {
                        on_retry(attempt, self.max_retries, delay);
                    }
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
