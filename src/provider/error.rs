//! Error taxonomy for the provider and orchestration layers.
//!
//! Each provider-facing error kind carries two policy predicates consumed by
//! the resilience combinators:
//!
//! * [`is_retryable`](SttError::is_retryable) — whether retrying the *same*
//!   provider can help (throttling only).
//! * [`is_fallback_eligible`](SttError::is_fallback_eligible) — whether a
//!   *different* provider should be attempted. Malformed audio is the
//!   canonical ineligible case: no provider can transcribe it.
//!
//! [`FailureClass`] feeds health ranking: auth, quota, and invalid-input
//! failures are permanent; throttling, network trouble, and timeouts are
//! transient. Unclassified errors default to transient so a provider is never
//! permanently blackballed on an unknown failure mode.

use thiserror::Error;

// ---------------------------------------------------------------------------
// FailureClass
// ---------------------------------------------------------------------------

/// Coarse failure classification used by health scoring and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Likely to clear on its own (throttle, network blip, timeout).
    Transient,
    /// Will not clear without operator action (bad key, exhausted quota).
    Permanent,
}

// ---------------------------------------------------------------------------
// SttError
// ---------------------------------------------------------------------------

/// Failures surfaced by speech-to-text providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SttError {
    /// Credentials rejected.
    #[error("STT authentication failed")]
    Auth,

    /// Account quota exhausted.
    #[error("STT quota exceeded")]
    QuotaExceeded,

    /// Provider asked us to slow down; the one retryable kind.
    #[error("STT request throttled")]
    Throttled,

    /// Provider refused a new concurrent session.
    #[error("STT session limit reached")]
    SessionLimit,

    /// The captured audio itself is unusable — no provider can fix this.
    #[error("audio rejected by provider: invalid or corrupt")]
    InvalidAudio,

    /// Transport-level failure.
    #[error("STT network error: {0}")]
    Network(String),

    /// Anything the provider adapter could not classify.
    #[error("STT error: {0}")]
    Unknown(String),
}

impl SttError {
    /// Whether retrying the same provider may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttled)
    }

    /// Whether a different provider should be given the same audio.
    ///
    /// Invalid audio is excluded: the input is broken, not the provider.
    pub fn is_fallback_eligible(&self) -> bool {
        !matches!(self, Self::InvalidAudio)
    }

    /// Classification for health scoring.
    pub fn failure_class(&self) -> FailureClass {
        match self {
            Self::Auth | Self::QuotaExceeded | Self::InvalidAudio => FailureClass::Permanent,
            Self::Throttled | Self::SessionLimit | Self::Network(_) | Self::Unknown(_) => {
                FailureClass::Transient
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RewriteError
// ---------------------------------------------------------------------------

/// Failures surfaced by text-rewrite providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// Credentials rejected.
    #[error("rewrite authentication failed")]
    Auth,

    /// Account quota exhausted.
    #[error("rewrite quota exceeded")]
    QuotaExceeded,

    /// Provider asked us to slow down.
    #[error("rewrite request throttled")]
    Throttled,

    /// The request itself was malformed (bad model id, oversized prompt…).
    #[error("invalid rewrite request: {0}")]
    InvalidRequest(String),

    /// Transport-level failure.
    #[error("rewrite network error: {0}")]
    Network(String),

    /// The provider's own deadline elapsed.
    #[error("rewrite request timed out")]
    Timeout,

    /// Anything the provider adapter could not classify.
    #[error("rewrite error: {0}")]
    Unknown(String),
}

impl RewriteError {
    /// Whether retrying the same provider may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttled)
    }

    /// Whether a different provider should be tried.
    pub fn is_fallback_eligible(&self) -> bool {
        !matches!(self, Self::InvalidRequest(_))
    }

    /// Classification for health scoring.
    pub fn failure_class(&self) -> FailureClass {
        match self {
            Self::Auth | Self::QuotaExceeded | Self::InvalidRequest(_) => FailureClass::Permanent,
            Self::Throttled | Self::Network(_) | Self::Timeout | Self::Unknown(_) => {
                FailureClass::Transient
            }
        }
    }
}

// ---------------------------------------------------------------------------
// StreamingError
// ---------------------------------------------------------------------------

/// Failures from realtime streaming STT sessions.
///
/// `is_fallback_eligible` here answers a different question than for batch
/// STT: whether the orchestrator should abandon streaming and re-run the
/// recording through batch transcription.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamingError {
    /// Session setup never completed.
    #[error("streaming connection failed: {0}")]
    ConnectionFailed(String),

    /// A chunk could not be delivered mid-session.
    #[error("streaming send failed: {0}")]
    SendFailed(String),

    /// The partial-result stream broke.
    #[error("streaming receive failed: {0}")]
    ReceiveFailed(String),

    /// Provider-reported session error.
    #[error("streaming provider error: {0}")]
    Provider(String),

    /// Finalize did not return within its budget; the underlying call was
    /// abandoned and the caller must tear the session down.
    #[error("streaming finalization timed out")]
    FinalizationTimeout,

    /// The session was cancelled. Never recovered into a batch fallback.
    #[error("streaming session cancelled")]
    Cancelled,

    /// A lifecycle violation (double finish, finish before attach…).
    #[error("invalid streaming state: {0}")]
    InvalidState(String),
}

impl StreamingError {
    /// Whether the orchestrator should drop to batch STT for this recording.
    pub fn is_fallback_eligible(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::InvalidState(_))
    }

    /// Stable snake_case code for diagnostics events.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::ConnectionFailed(_) => "connection_failed",
            Self::SendFailed(_) => "send_failed",
            Self::ReceiveFailed(_) => "receive_failed",
            Self::Provider(_) => "provider_error",
            Self::FinalizationTimeout => "finalization_timeout",
            Self::Cancelled => "cancelled",
            Self::InvalidState(_) => "invalid_state",
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Orchestration-level failures surfaced to the pipeline's caller.
///
/// These only appear after every degradation path is exhausted; provider
/// errors that can be recovered (rewrite failure → raw transcript, encode
/// failure → unencoded upload) never become a `PipelineError`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Transcription produced no usable text.
    #[error("no transcript produced")]
    NoTranscript,

    /// The captured audio contains no frames — nothing to transcribe.
    #[error("no audio captured")]
    EmptyCapture,

    /// The overall pipeline deadline elapsed during transcription.
    #[error("pipeline timed out")]
    PipelineTimeout,

    /// All STT attempts failed; carries the final provider error.
    #[error("transcription failed: {0}")]
    Stt(#[from] SttError),

    /// The paste collaborator failed.
    #[error("paste failed: {0}")]
    Paste(String),

    /// Internal / unexpected error (invalid configuration, join failure…).
    #[error("internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_throttled_stt_errors_are_retryable() {
        assert!(SttError::Throttled.is_retryable());
        for err in [
            SttError::Auth,
            SttError::QuotaExceeded,
            SttError::SessionLimit,
            SttError::InvalidAudio,
            SttError::Network("down".into()),
            SttError::Unknown("?".into()),
        ] {
            assert!(!err.is_retryable(), "{err:?} must not be retryable");
        }
    }

    #[test]
    fn invalid_audio_is_not_fallback_eligible() {
        assert!(!SttError::InvalidAudio.is_fallback_eligible());
        assert!(SttError::Network("down".into()).is_fallback_eligible());
        assert!(SttError::Auth.is_fallback_eligible());
    }

    #[test]
    fn stt_failure_classification_matches_policy() {
        assert_eq!(SttError::Auth.failure_class(), FailureClass::Permanent);
        assert_eq!(
            SttError::QuotaExceeded.failure_class(),
            FailureClass::Permanent
        );
        assert_eq!(
            SttError::InvalidAudio.failure_class(),
            FailureClass::Permanent
        );
        assert_eq!(SttError::Throttled.failure_class(), FailureClass::Transient);
        assert_eq!(
            SttError::Network("x".into()).failure_class(),
            FailureClass::Transient
        );
        // Optimistic default: never blackball a provider on an unknown error.
        assert_eq!(
            SttError::Unknown("x".into()).failure_class(),
            FailureClass::Transient
        );
    }

    #[test]
    fn rewrite_invalid_request_is_permanent_and_not_fallback_eligible() {
        let err = RewriteError::InvalidRequest("bad model".into());
        assert_eq!(err.failure_class(), FailureClass::Permanent);
        assert!(!err.is_fallback_eligible());
    }

    #[test]
    fn rewrite_timeout_is_transient_and_fallback_eligible() {
        assert_eq!(RewriteError::Timeout.failure_class(), FailureClass::Transient);
        assert!(RewriteError::Timeout.is_fallback_eligible());
    }

    #[test]
    fn streaming_cancelled_and_invalid_state_never_trigger_batch_fallback() {
        assert!(!StreamingError::Cancelled.is_fallback_eligible());
        assert!(!StreamingError::InvalidState("closed".into()).is_fallback_eligible());
        assert!(StreamingError::FinalizationTimeout.is_fallback_eligible());
        assert!(StreamingError::ConnectionFailed("refused".into()).is_fallback_eligible());
    }

    #[test]
    fn streaming_reason_codes_are_stable() {
        assert_eq!(
            StreamingError::FinalizationTimeout.reason_code(),
            "finalization_timeout"
        );
        assert_eq!(
            StreamingError::ConnectionFailed("x".into()).reason_code(),
            "connection_failed"
        );
    }

    #[test]
    fn error_display_carries_detail() {
        let err = SttError::Network("connection refused".into());
        assert!(err.to_string().contains("connection refused"));

        let err = PipelineError::Stt(SttError::Auth);
        assert!(err.to_string().contains("authentication"));
    }
}
