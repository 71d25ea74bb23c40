//! Pipeline settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every field has a default, so a partial `settings.toml` written by an
//! older version still loads.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::level::{
    ProcessingLevel, CLEAN_REWRITE_TIMEOUT, DEFAULT_REWRITE_MODEL, POLISH_REWRITE_TIMEOUT,
};
use crate::rewrite::cache::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_MAX_CHARS, DEFAULT_CACHE_TTL};
use crate::stream::pump::{
    FinalizeTimeoutPolicy, DEFAULT_FINALIZE_BASE, DEFAULT_FINALIZE_MAX,
    DEFAULT_FINALIZE_PER_AUDIO_SECOND,
};

use super::AppPaths;

// ---------------------------------------------------------------------------
// RewriteConfig
// ---------------------------------------------------------------------------

/// Settings for the rewrite stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Model identifier handed to the rewrite provider
    /// (e.g. `"gemini-2.5-flash-lite"`, `"x-ai/grok-4.1-fast"`).
    pub model: String,
    /// Maximum seconds to wait for a Clean-level rewrite.
    pub clean_timeout_secs: u64,
    /// Maximum seconds to wait for a Polish-level rewrite.
    pub polish_timeout_secs: u64,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_REWRITE_MODEL.into(),
            clean_timeout_secs: CLEAN_REWRITE_TIMEOUT.as_secs(),
            polish_timeout_secs: POLISH_REWRITE_TIMEOUT.as_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// CacheConfig
// ---------------------------------------------------------------------------

/// Settings for the rewrite result cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached rewrites.
    pub capacity: usize,
    /// Seconds before a cached rewrite expires.
    pub ttl_secs: u64,
    /// Transcripts or rewrites longer than this many chars are not cached.
    pub max_entry_chars: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            max_entry_chars: DEFAULT_CACHE_MAX_CHARS,
        }
    }
}

// ---------------------------------------------------------------------------
// StreamingConfig
// ---------------------------------------------------------------------------

/// Settings for streaming-session finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Base finalize timeout in seconds.
    pub finalize_base_secs: u64,
    /// Extra finalize budget per second of streamed audio.
    pub finalize_per_audio_second: f64,
    /// Hard finalize ceiling in seconds.
    pub finalize_max_secs: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            finalize_base_secs: DEFAULT_FINALIZE_BASE.as_secs(),
            finalize_per_audio_second: DEFAULT_FINALIZE_PER_AUDIO_SECOND,
            finalize_max_secs: DEFAULT_FINALIZE_MAX.as_secs(),
        }
    }
}

impl StreamingConfig {
    pub fn finalize_policy(&self) -> FinalizeTimeoutPolicy {
        FinalizeTimeoutPolicy::new(
            Duration::from_secs(self.finalize_base_secs),
            self.finalize_per_audio_second,
            Duration::from_secs(self.finalize_max_secs),
        )
    }
}

// ---------------------------------------------------------------------------
// PipelineSettings  (top-level)
// ---------------------------------------------------------------------------

/// Top-level pipeline configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_pipeline::config::PipelineSettings;
///
/// // Load (returns Default when file is missing)
/// let settings = PipelineSettings::load().unwrap();
///
/// // Modify and save
/// // settings.save().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// How aggressively transcripts are rewritten.
    pub processing_level: ProcessingLevel,
    /// Overall deadline in seconds for one dictation run's transcription.
    pub pipeline_timeout_secs: u64,
    /// Recordings at or above this many bytes are re-encoded before upload
    /// when an encoder is available; smaller files upload as-is.
    pub encode_bypass_threshold_bytes: u64,
    /// Rewrite stage settings.
    pub rewrite: RewriteConfig,
    /// Rewrite cache settings.
    pub cache: CacheConfig,
    /// Streaming finalization settings.
    pub streaming: StreamingConfig,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            processing_level: ProcessingLevel::default(),
            pipeline_timeout_secs: 120,
            encode_bypass_threshold_bytes: 200_000,
            rewrite: RewriteConfig::default(),
            cache: CacheConfig::default(),
            streaming: StreamingConfig::default(),
        }
    }
}

impl PipelineSettings {
    /// Load settings from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(PipelineSettings::default())` when the file does not exist
    /// yet (first-run scenario) so callers never need to special-case a
    /// missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to the platform-appropriate `settings.toml`, creating
    /// parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline_timeout_secs)
    }

    /// Rewrite timeout for `level`; `None` for Raw (no rewrite runs).
    pub fn rewrite_timeout(&self, level: ProcessingLevel) -> Option<Duration> {
        match level {
            ProcessingLevel::Raw => None,
            ProcessingLevel::Clean => Some(Duration::from_secs(self.rewrite.clean_timeout_secs)),
            ProcessingLevel::Polish => Some(Duration::from_secs(self.rewrite.polish_timeout_secs)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
