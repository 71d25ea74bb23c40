//! Processing levels — how aggressively the rewrite stage transforms a
//! transcript.
//!
//! | Level  | Rewrite stage                        | Stage timeout |
//! |--------|--------------------------------------|---------------|
//! | Raw    | Skipped entirely                     | —             |
//! | Clean  | Light-touch cleanup (filler, punct.) | 15 s          |
//! | Polish | Full rewrite for clarity and flow    | 30 s          |
//!
//! Every level also carries the quality-gate minimum ratio used to reject
//! degenerate rewrites (see [`crate::rewrite::quality`]).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Single default rewrite model shared by Clean and Polish.
///
/// One model for all levels keeps routing simple; per-level model selection
/// was not worth the configuration surface.
pub const DEFAULT_REWRITE_MODEL: &str = "gemini-2.5-flash-lite";

/// Default rewrite-stage timeout for [`ProcessingLevel::Clean`].
pub const CLEAN_REWRITE_TIMEOUT: Duration = Duration::from_secs(15);
/// Default rewrite-stage timeout for [`ProcessingLevel::Polish`].
pub const POLISH_REWRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum acceptable candidate/raw length ratio for Clean.
pub const CLEAN_MINIMUM_RATIO: f64 = 0.6;
/// Minimum acceptable candidate/raw length ratio for Polish.
///
/// Polish intentionally compresses rambling dictation, so the floor is lower.
pub const POLISH_MINIMUM_RATIO: f64 = 0.3;

// ---------------------------------------------------------------------------
// ProcessingLevel
// ---------------------------------------------------------------------------

/// Controls whether and how the rewrite stage transforms the raw transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingLevel {
    /// Paste the trimmed transcript exactly as transcribed.
    Raw,
    /// Minimal cleanup: filler removal, punctuation, capitalization.
    Clean,
    /// Full rewrite into the strongest written form of the same ideas.
    Polish,
}

impl Default for ProcessingLevel {
    fn default() -> Self {
        Self::Clean
    }
}

impl ProcessingLevel {
    /// Rewrite model id used when the caller does not specify one.
    ///
    /// Empty for [`Raw`](Self::Raw) — the rewrite stage is never entered.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Raw => "",
            Self::Clean | Self::Polish => DEFAULT_REWRITE_MODEL,
        }
    }

    /// Rewrite-stage timeout budget, or `None` for [`Raw`](Self::Raw).
    pub fn rewrite_timeout(&self) -> Option<Duration> {
        match self {
            Self::Raw => None,
            Self::Clean => Some(CLEAN_REWRITE_TIMEOUT),
            Self::Polish => Some(POLISH_REWRITE_TIMEOUT),
        }
    }

    /// Quality-gate minimum candidate/raw length ratio.
    ///
    /// Raw is 0.0: the gate is never consulted because rewrite is skipped.
    pub fn minimum_ratio(&self) -> f64 {
        match self {
            Self::Raw => 0.0,
            Self::Clean => CLEAN_MINIMUM_RATIO,
            Self::Polish => POLISH_MINIMUM_RATIO,
        }
    }

    /// Stable lowercase name used in diagnostics and log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Clean => "clean",
            Self::Polish => "polish",
        }
    }
}

impl std::fmt::Display for ProcessingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
