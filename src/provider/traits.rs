//! Provider contracts — the seams between the orchestration core and the
//! concrete vendor adapters.
//!
//! Every trait here is object-safe and `Send + Sync` so implementations can be
//! held behind `Arc<dyn …>` and wrapped recursively by the resilience
//! combinators: a `TimeoutStt` can wrap a `FallbackStt` that wraps a
//! `RetryingStt` around a concrete client, and each layer still satisfies
//! [`SttProvider`].
//!
//! Concrete HTTP clients for specific vendors live outside this crate; the
//! core only defines what they must look like.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::level::ProcessingLevel;
use crate::provider::error::{PipelineError, RewriteError, SttError, StreamingError};

// ---------------------------------------------------------------------------
// Batch provider traits
// ---------------------------------------------------------------------------

/// Speech-to-text: a recorded audio file in, a transcript out.
#[async_trait]
pub trait SttProvider: Send + Sync {
    /// Transcribe the audio file at `audio`.
    async fn transcribe(&self, audio: &Path) -> Result<String, SttError>;
}

/// Text rewrite: transform a transcript under a system prompt and model id.
#[async_trait]
pub trait RewriteProvider: Send + Sync {
    async fn rewrite(
        &self,
        transcript: &str,
        system_prompt: &str,
        model: &str,
    ) -> Result<String, RewriteError>;
}

// Compile-time object-safety assertions.
const _: fn() = || {
    fn _assert_stt(_: Box<dyn SttProvider>) {}
    fn _assert_rewrite(_: Box<dyn RewriteProvider>) {}
};

// ---------------------------------------------------------------------------
// Streaming types
// ---------------------------------------------------------------------------

/// PCM audio payload pushed into streaming STT sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// Raw 16-bit little-endian PCM samples.
    pub pcm16le: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioChunk {
    /// A chunk with the pipeline's native format: 16 kHz mono.
    pub fn new(pcm16le: Vec<u8>) -> Self {
        Self {
            pcm16le,
            sample_rate: 16_000,
            channels: 1,
        }
    }
}

/// Incremental transcript update from a realtime session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialTranscript {
    pub text: String,
    pub is_final: bool,
}

// ---------------------------------------------------------------------------
// Streaming provider traits
// ---------------------------------------------------------------------------

/// One live transcription session.
///
/// Sessions are shared behind `Arc` because finalization may have to be
/// abandoned mid-flight (see the streaming bridge): `cancel` must remain
/// callable while a `finish` call is still pending on another task.
#[async_trait]
pub trait StreamingSttSession: Send + Sync {
    /// Deliver one audio chunk. Chunks arrive strictly in capture order.
    async fn send_audio_chunk(&self, chunk: AudioChunk) -> Result<(), StreamingError>;

    /// Hand over the partial-transcript stream.
    ///
    /// Returns `Some` exactly once; there is a single consumer (the bridge's
    /// partial reader). Later calls return `None`.
    fn take_partials(&self) -> Option<mpsc::Receiver<PartialTranscript>>;

    /// Close the session and return its best-known final transcript.
    async fn finish(&self) -> Result<String, StreamingError>;

    /// Tear the session down. Must unblock any pending `finish` call.
    async fn cancel(&self);
}

/// Factory for provider-specific streaming sessions.
#[async_trait]
pub trait StreamingSttProvider: Send + Sync {
    async fn make_session(&self) -> Result<Arc<dyn StreamingSttSession>, StreamingError>;
}

// ---------------------------------------------------------------------------
// External collaborators
// ---------------------------------------------------------------------------

/// Hands final text to the host environment (clipboard + paste keystroke,
/// UI-affine — mechanics live outside the core).
#[async_trait]
pub trait TextPaster: Send + Sync {
    async fn paste(&self, text: &str) -> Result<(), PipelineError>;
}

/// Best-effort re-encode of captured audio into a compact upload format.
///
/// Failure must never fail the pipeline; the orchestrator falls back to the
/// unencoded file.
#[async_trait]
pub trait AudioEncoder: Send + Sync {
    /// Convert the file at `input`, returning the path of the encoded output.
    async fn convert_to_upload_format(&self, input: &Path) -> Result<PathBuf, String>;
}

/// Read-only preferences seam injected into the orchestrator.
///
/// Core logic never reaches for global state; the host supplies whatever is
/// backing its settings UI.
pub trait PreferencesReading: Send + Sync {
    fn processing_level(&self) -> ProcessingLevel;
}

/// A fixed processing level, for hosts without live preferences (and tests).
pub struct FixedPreferences(pub ProcessingLevel);

impl PreferencesReading for FixedPreferences {
    fn processing_level(&self) -> ProcessingLevel {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_chunk_defaults_to_16khz_mono() {
        let chunk = AudioChunk::new(vec![0, 0, 1, 0]);
        assert_eq!(chunk.sample_rate, 16_000);
        assert_eq!(chunk.channels, 1);
    }

    #[test]
    fn fixed_preferences_returns_configured_level() {
        let prefs = FixedPreferences(ProcessingLevel::Polish);
        assert_eq!(prefs.processing_level(), ProcessingLevel::Polish);
    }

    /// If this compiles, all provider traits are object-safe.
    #[test]
    fn provider_traits_are_object_safe() {
        fn _takes(
            _stt: &dyn SttProvider,
            _rw: &dyn RewriteProvider,
            _streaming: &dyn StreamingSttProvider,
            _session: &dyn StreamingSttSession,
            _paster: &dyn TextPaster,
            _encoder: &dyn AudioEncoder,
            _prefs: &dyn PreferencesReading,
        ) {
        }
    }
}
