//! Stage timing for one pipeline run.
//!
//! Every `process_*` call produces exactly one [`PipelineTiming`], success
//! or error, so latency regressions show up in logs without any extra
//! instrumentation in the stages themselves.

use std::time::Duration;

use tokio::time::Instant;

use crate::level::ProcessingLevel;

// ---------------------------------------------------------------------------
// PipelineTiming
// ---------------------------------------------------------------------------

/// Wall-clock breakdown of one dictation run.
#[derive(Debug, Clone)]
pub struct PipelineTiming {
    pub started_at: Instant,
    pub level: Option<ProcessingLevel>,
    pub encode: Option<Duration>,
    pub stt: Option<Duration>,
    pub rewrite: Option<Duration>,
    pub paste: Option<Duration>,
    /// Streaming finalize time; `Some` only for streaming runs.
    pub finalize: Option<Duration>,
    pub original_bytes: Option<u64>,
    pub encoded_bytes: Option<u64>,
}

impl PipelineTiming {
    pub fn start() -> Self {
        Self {
            started_at: Instant::now(),
            level: None,
            encode: None,
            stt: None,
            rewrite: None,
            paste: None,
            finalize: None,
            original_bytes: None,
            encoded_bytes: None,
        }
    }

    /// Elapsed since the run started; live until the struct is dropped.
    pub fn total(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// One-line log summary, e.g.
    /// `total=2.31s stt=1.80s rewrite=0.42s paste=0.04s level=clean upload=1.2 MB`.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("total={}", fmt_duration(self.total()))];
        if let Some(finalize) = self.finalize {
            parts.push(format!("finalize={}", fmt_duration(finalize)));
        }
        if let Some(encode) = self.encode {
            parts.push(format!("encode={}", fmt_duration(encode)));
        }
        if let Some(stt) = self.stt {
            parts.push(format!("stt={}", fmt_duration(stt)));
        }
        if let Some(rewrite) = self.rewrite {
            parts.push(format!("rewrite={}", fmt_duration(rewrite)));
        }
        if let Some(paste) = self.paste {
            parts.push(format!("paste={}", fmt_duration(paste)));
        }
        if let Some(level) = self.level {
            parts.push(format!("level={level}"));
        }
        match (self.original_bytes, self.encoded_bytes) {
            (Some(original), Some(encoded)) => parts.push(format!(
                "upload={} (from {})",
                format_bytes(encoded),
                format_bytes(original)
            )),
            (Some(original), None) => parts.push(format!("upload={}", format_bytes(original))),
            _ => {}
        }
        parts.join(" ")
    }
}

fn fmt_duration(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f64())
}

/// Human-readable byte count: `824 B`, `1.2 KB`, `3.4 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_picks_sensible_units() {
        assert_eq!(format_bytes(824), "824 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024 + 400 * 1024), "3.4 MB");
    }

    #[tokio::test(start_paused = true)]
    async fn total_tracks_elapsed_time() {
        let timing = PipelineTiming::start();
        tokio::time::advance(Duration::from_millis(250)).await;
        assert_eq!(timing.total(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn summary_includes_recorded_stages_only() {
        let mut timing = PipelineTiming::start();
        tokio::time::advance(Duration::from_secs(2)).await;
        timing.level = Some(ProcessingLevel::Clean);
        timing.stt = Some(Duration::from_millis(1800));
        timing.rewrite = Some(Duration::from_millis(420));
        timing.original_bytes = Some(2 * 1024 * 1024);
        timing.encoded_bytes = Some(300 * 1024);

        let summary = timing.summary();
        assert!(summary.contains("total=2.00s"));
        assert!(summary.contains("stt=1.80s"));
        assert!(summary.contains("rewrite=0.42s"));
        assert!(summary.contains("level=clean"));
        assert!(summary.contains("upload=300.0 KB (from 2.0 MB)"));
        assert!(!summary.contains("finalize"));
        assert!(!summary.contains("paste"));
    }

    #[tokio::test(start_paused = true)]
    async fn streaming_runs_report_finalize() {
        let mut timing = PipelineTiming::start();
        timing.finalize = Some(Duration::from_millis(900));
        assert!(timing.summary().contains("finalize=0.90s"));
    }
}
