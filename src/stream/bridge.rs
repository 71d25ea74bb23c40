//! Capture-to-session bridge for streaming transcription.
//!
//! Audio capture starts immediately on hotkey press, but the streaming
//! session takes a network round-trip to establish. The bridge buffers
//! chunks in arrival order until a session is attached, then drains them
//! through the pump, preserving FIFO order even when capture outruns the
//! network. One drain task runs at a time.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::provider::{AudioChunk, StreamingError, StreamingSttSession};
use crate::stream::pump::{FinalizeTimeoutPolicy, SessionPump};

// ---------------------------------------------------------------------------
// StreamingAudioBridge
// ---------------------------------------------------------------------------

struct BridgeState {
    pending: VecDeque<AudioChunk>,
    pump: Option<Arc<SessionPump>>,
    drain: Option<JoinHandle<()>>,
    accepts_chunks: bool,
    /// Total capture-time length of everything enqueued so far.
    streamed: Duration,
}

pub struct StreamingAudioBridge {
    state: Arc<Mutex<BridgeState>>,
    finalize_policy: FinalizeTimeoutPolicy,
}

impl StreamingAudioBridge {
    pub fn new(finalize_policy: FinalizeTimeoutPolicy) -> Self {
        Self {
            state: Arc::new(Mutex::new(BridgeState {
                pending: VecDeque::new(),
                pump: None,
                drain: None,
                accepts_chunks: true,
                streamed: Duration::ZERO,
            })),
            finalize_policy,
        }
    }

    /// Queue one captured chunk for delivery. Dropped silently once the
    /// bridge stopped accepting (after finish, cancel, or failure).
    pub fn enqueue(&self, chunk: AudioChunk) {
        let mut state = self.state.lock().unwrap();
        if !state.accepts_chunks {
            return;
        }
        state.streamed += chunk_duration(&chunk);
        state.pending.push_back(chunk);
        Self::maybe_start_drain(&self.state, &mut state);
    }

    /// Attach the established session. Only the first call takes effect.
    pub fn attach_session(&self, session: Arc<dyn StreamingSttSession>) {
        let mut state = self.state.lock().unwrap();
        if state.pump.is_some() || !state.accepts_chunks {
            return;
        }
        state.pump = Some(SessionPump::new(session));
        Self::maybe_start_drain(&self.state, &mut state);
    }

    /// Session establishment failed: stop buffering, the recording will go
    /// through batch transcription instead.
    pub fn mark_failed(&self) {
        let mut state = self.state.lock().unwrap();
        state.accepts_chunks = false;
        state.pending.clear();
    }

    /// Whether chunks enqueued now would still be delivered.
    pub fn is_accepting(&self) -> bool {
        self.state.lock().unwrap().accepts_chunks
    }

    /// Stop accepting input, flush everything queued, and finalize.
    pub async fn finish(&self) -> Result<String, StreamingError> {
        let (drain, pump, timeout) = {
            let mut state = self.state.lock().unwrap();
            state.accepts_chunks = false;
            (
                state.drain.take(),
                state.pump.clone(),
                self.finalize_policy.timeout_for(state.streamed),
            )
        };

        if let Some(drain) = drain {
            let _ = drain.await;
        }
        // Chunks enqueued between drain completion and accepts_chunks
        // flipping are flushed inline.
        let pump = match pump {
            Some(pump) => pump,
            None => {
                return Err(StreamingError::ConnectionFailed(
                    "streaming session was never established".into(),
                ))
            }
        };
        loop {
            let chunk = self.state.lock().unwrap().pending.pop_front();
            match chunk {
                Some(chunk) => pump.send(chunk).await,
                None => break,
            }
        }

        pump.finish(timeout).await
    }

    /// Abandon the stream: discard queued audio and tear the session down.
    pub async fn cancel(&self) {
        let (drain, pump) = {
            let mut state = self.state.lock().unwrap();
            state.accepts_chunks = false;
            state.pending.clear();
            (state.drain.take(), state.pump.clone())
        };
        if let Some(drain) = drain {
            drain.abort();
            let _ = drain.await;
        }
        if let Some(pump) = pump {
            pump.cancel().await;
        }
    }

    /// Spawn a drain task if chunks are waiting, a pump exists, and no
    /// drain is already running. Caller holds the state lock.
    fn maybe_start_drain(shared: &Arc<Mutex<BridgeState>>, state: &mut BridgeState) {
        if state.drain.is_some() || state.pending.is_empty() {
            return;
        }
        let pump = match &state.pump {
            Some(pump) => Arc::clone(pump),
            None => return,
        };
        let shared = Arc::clone(shared);
        state.drain = Some(tokio::spawn(async move {
            loop {
                let chunk = {
                    let mut state = shared.lock().unwrap();
                    match state.pending.pop_front() {
                        Some(chunk) => chunk,
                        None => {
                            state.drain = None;
                            break;
                        }
                    }
                };
                pump.send(chunk).await;
            }
        }));
    }
}

fn chunk_duration(chunk: &AudioChunk) -> Duration {
    let bytes_per_second = u64::from(chunk.sample_rate) * u64::from(chunk.channels) * 2;
    if bytes_per_second == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(chunk.pcm16le.len() as f64 / bytes_per_second as f64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
