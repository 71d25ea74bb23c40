//! Configuration module for the dictation pipeline.
//!
//! Provides `PipelineSettings` (top-level settings), sub-configs for each
//! subsystem, `AppPaths` for cross-platform data directories, and TOML
//! persistence via `PipelineSettings::load` / `PipelineSettings::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{CacheConfig, PipelineSettings, RewriteConfig, StreamingConfig};
