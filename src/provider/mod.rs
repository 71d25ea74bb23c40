//! Provider interfaces and error taxonomy.
//!
//! This module defines:
//! * [`SttProvider`] / [`RewriteProvider`] — the batch provider contracts
//!   every concrete adapter and every resilience combinator implements.
//! * [`StreamingSttProvider`] / [`StreamingSttSession`] — the realtime
//!   transcription contract consumed by the streaming bridge.
//! * [`TextPaster`] / [`AudioEncoder`] / [`PreferencesReading`] — the
//!   external collaborators the orchestrator is handed at construction.
//! * [`SttError`] / [`RewriteError`] / [`StreamingError`] /
//!   [`PipelineError`] — the error taxonomy with its retryability,
//!   fallback-eligibility, and failure-class policy.

pub mod error;
#[cfg(test)]
pub mod mock;
pub mod traits;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use error::{FailureClass, PipelineError, RewriteError, SttError, StreamingError};
pub use traits::{
    AudioChunk, AudioEncoder, FixedPreferences, PartialTranscript, PreferencesReading,
    RewriteProvider, SttProvider, StreamingSttProvider, StreamingSttSession, TextPaster,
};
