//! Provider-orchestration core for voice dictation.
//!
//! Turns one recorded (or streamed) dictation into pasted text:
//!
//! ```text
//! audio file ──▶ optional re-encode ──▶ STT ──▶ rewrite (LLM) ──▶ paste
//!                                        ▲          │
//!            streaming session ──────────┘          └─ quality gate + cache
//! ```
//!
//! The crate deliberately contains no vendor HTTP clients, no audio capture
//! and no clipboard mechanics. Those arrive as trait objects
//! ([`provider::SttProvider`], [`provider::RewriteProvider`],
//! [`provider::TextPaster`], …); everything here is the logic between them:
//!
//! - [`resilience`] — retry, timeout, fallback chains, hedged races,
//!   health-ranked ordering and concurrency caps, each wrapping a provider
//!   and implementing the same trait so they stack freely.
//! - [`rewrite`] — per-level prompts, model-id routing across backends, a
//!   length-ratio quality gate and a TTL result cache.
//! - [`stream`] — bridges capture-time audio chunks into a realtime STT
//!   session, with bounded finalization.
//! - [`pipeline`] — the orchestrator that strings the stages together and
//!   degrades gracefully (rewrite failures fall back to the raw transcript,
//!   streaming failures fall back to batch upload).

pub mod config;
pub mod level;
pub mod pipeline;
pub mod provider;
pub mod resilience;
pub mod rewrite;
pub mod stream;

pub use level::ProcessingLevel;
pub use pipeline::DictationPipeline;
pub use provider::{PipelineError, RewriteError, SttError, StreamingError};
