//! Pipeline orchestration: stage timing and the dictation runner.

pub mod runner;
pub mod timing;

pub use runner::{DiagnosticsSink, DictationPipeline, ProcessedHook, TimingSink};
pub use timing::{format_bytes, PipelineTiming};
