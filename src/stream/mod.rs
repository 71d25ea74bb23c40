//! Realtime streaming transcription: capture-side bridge and session pump.

pub mod bridge;
pub mod pump;

pub use bridge::StreamingAudioBridge;
pub use pump::{
    FinalizeTimeoutPolicy, SessionPump, DEFAULT_FINALIZE_BASE, DEFAULT_FINALIZE_MAX,
    DEFAULT_FINALIZE_PER_AUDIO_SECOND,
};
