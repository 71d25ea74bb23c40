//! Single-session pump: feeds chunks into one streaming STT session and
//! tracks its partial transcripts.
//!
//! Finalization is the one place this crate abandons a task instead of
//! cancelling it: some transports do not honor cancellation mid-finalize,
//! so `finish` races the session's finalize call as a detached task against
//! a deadline. On timeout the pump reports [`StreamingError::FinalizationTimeout`]
//! immediately and leaves the task running; the caller is expected to
//! `cancel` afterwards to tear the session down.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::provider::{AudioChunk, StreamingError, StreamingSttSession};

// ---------------------------------------------------------------------------
// Finalize timeout policy
// ---------------------------------------------------------------------------

/// How long to wait for a session to finalize, scaled by how much audio was
/// streamed: longer recordings legitimately take longer to flush.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalizeTimeoutPolicy {
    pub base: Duration,
    /// Extra budget per second of streamed audio.
    pub per_audio_second: f64,
    pub max: Duration,
}

pub const DEFAULT_FINALIZE_BASE: Duration = Duration::from_secs(8);
pub const DEFAULT_FINALIZE_PER_AUDIO_SECOND: f64 = 0.05;
pub const DEFAULT_FINALIZE_MAX: Duration = Duration::from_secs(20);

impl Default for FinalizeTimeoutPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_FINALIZE_BASE,
            per_audio_second: DEFAULT_FINALIZE_PER_AUDIO_SECOND,
            max: DEFAULT_FINALIZE_MAX,
        }
    }
}

impl FinalizeTimeoutPolicy {
    /// Build a policy, replacing unusable values with the defaults.
    pub fn new(base: Duration, per_audio_second: f64, max: Duration) -> Self {
        let defaults = Self::default();
        let base = if base.is_zero() { defaults.base } else { base };
        let per_audio_second = if per_audio_second.is_finite() && per_audio_second >= 0.0 {
            per_audio_second
        } else {
            defaults.per_audio_second
        };
        let max = if max.is_zero() { defaults.max } else { max };
        Self {
            base,
            per_audio_second,
            max: max.max(base),
        }
    }

    /// Timeout for a recording of `streamed` audio length.
    pub fn timeout_for(&self, streamed: Duration) -> Duration {
        let scaled = self.base.as_secs_f64() + self.per_audio_second * streamed.as_secs_f64();
        Duration::from_secs_f64(scaled).min(self.max)
    }
}

// ---------------------------------------------------------------------------
// SessionPump
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Open,
    Finishing,
    Closed,
}

struct PumpState {
    phase: Phase,
    /// First chunk-delivery failure, surfaced at finish time.
    send_error: Option<StreamingError>,
}

pub struct SessionPump {
    session: Arc<dyn StreamingSttSession>,
    state: Mutex<PumpState>,
    /// Latest trimmed non-empty partial, written by the reader task.
    last_partial: Arc<Mutex<Option<String>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl SessionPump {
    /// Wrap a freshly created session and start its partial reader.
    pub fn new(session: Arc<dyn StreamingSttSession>) -> Arc<Self> {
        let last_partial = Arc::new(Mutex::new(None));
        let reader = session.take_partials().map(|mut partials| {
            let last_partial = Arc::clone(&last_partial);
            tokio::spawn(async move {
                while let Some(partial) = partials.recv().await {
                    let text = partial.text.trim();
                    if !text.is_empty() {
                        *last_partial.lock().unwrap() = Some(text.to_string());
                    }
                }
            })
        });

        Arc::new(Self {
            session,
            state: Mutex::new(PumpState {
                phase: Phase::Open,
                send_error: None,
            }),
            last_partial,
            reader: Mutex::new(reader),
        })
    }

    /// Forward one chunk. Chunks arriving after the session stopped being
    /// open, or after a send failure, are dropped.
    pub async fn send(&self, chunk: AudioChunk) {
        {
            let state = self.state.lock().unwrap();
            if state.phase != Phase::Open || state.send_error.is_some() {
                return;
            }
        }
        if let Err(error) = self.session.send_audio_chunk(chunk).await {
            log::warn!("streaming chunk delivery failed: {error}");
            let mut state = self.state.lock().unwrap();
            if state.send_error.is_none() {
                state.send_error = Some(error);
            }
        }
    }

    pub fn last_partial(&self) -> Option<String> {
        self.last_partial.lock().unwrap().clone()
    }

    /// Finalize the session and return its transcript.
    ///
    /// Only valid while open. An empty finalized transcript is replaced by
    /// the last partial seen, if any.
    pub async fn finish(&self, timeout: Duration) -> Result<String, StreamingError> {
        {
            let mut state = self.state.lock().unwrap();
            match state.phase {
                Phase::Open => state.phase = Phase::Finishing,
                Phase::Finishing => {
                    return Err(StreamingError::InvalidState("finish already in flight".into()))
                }
                Phase::Closed => {
                    return Err(StreamingError::InvalidState("session already closed".into()))
                }
            }
            if let Some(error) = state.send_error.take() {
                state.phase = Phase::Closed;
                return Err(error);
            }
        }

        // Detached on purpose: dropping the JoinHandle on timeout abandons
        // the finalize call rather than cancelling it.
        let session = Arc::clone(&self.session);
        let finalize = tokio::spawn(async move { session.finish().await });

        let result = tokio::select! {
            joined = finalize => match joined {
                Ok(result) => result,
                Err(_) => Err(StreamingError::Provider("finalize task failed".into())),
            },
            _ = tokio::time::sleep(timeout) => {
                log::warn!("streaming finalize abandoned after {timeout:?}");
                return Err(StreamingError::FinalizationTimeout);
            }
        };

        self.stop_reader();
        self.state.lock().unwrap().phase = Phase::Closed;

        let transcript = result?;
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Ok(self.last_partial().unwrap_or_default());
        }
        Ok(transcript.to_string())
    }

    /// Tear the session down. Safe in any phase, including after an
    /// abandoned finalize.
    pub async fn cancel(&self) {
        self.state.lock().unwrap().phase = Phase::Closed;
        self.stop_reader();
        self.session.cancel().await;
    }

    fn stop_reader(&self) {
        if let Some(reader) = self.reader.lock().unwrap().take() {
            reader.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
