//! Hedged race across STT providers.
//!
//! All entries launch concurrently, each after its configured stagger delay;
//! the first *success* wins and every other in-flight attempt is aborted. A
//! failure that is not fallback-eligible kills the whole race immediately —
//! waiting on the other hedges cannot help when the audio itself is bad.
//! Otherwise the race keeps waiting and only fails once every entry has
//! failed, surfacing the last error seen.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinSet;

use crate::provider::{SttError, SttProvider};

// ---------------------------------------------------------------------------
// HedgedStt
// ---------------------------------------------------------------------------

/// One contender in the race.
pub struct HedgedEntry {
    pub name: String,
    pub provider: Arc<dyn SttProvider>,
    /// How long to hold this entry back before it starts.
    pub delay: Duration,
}

impl HedgedEntry {
    pub fn new(name: impl Into<String>, provider: Arc<dyn SttProvider>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            provider,
            delay,
        }
    }
}

enum Attempt {
    Success { name: String, transcript: String },
    Failure { name: String, error: SttError },
}

/// Staggered first-success race over multiple STT providers.
pub struct HedgedStt {
    entries: Vec<HedgedEntry>,
    on_provider_start: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

impl HedgedStt {
    /// # Panics
    /// Panics if `entries` is empty, or any name is blank or duplicated
    /// after trimming.
    pub fn new(entries: Vec<HedgedEntry>) -> Self {
        assert!(!entries.is_empty(), "HedgedStt requires at least one entry");

        let mut normalized = Vec::with_capacity(entries.len());
        let mut seen = std::collections::HashSet::new();
        for (index, entry) in entries.into_iter().enumerate() {
            let name = entry.name.trim().to_string();
            assert!(!name.is_empty(), "entry at index {index} has an empty name");
            assert!(seen.insert(name.clone()), "duplicate entry name: {name}");
            normalized.push(HedgedEntry {
                name,
                provider: entry.provider,
                delay: entry.delay,
            });
        }

        Self {
            entries: normalized,
            on_provider_start: None,
        }
    }

    /// Hook invoked with the entry name when its attempt actually starts
    /// (after its stagger delay).
    pub fn with_start_callback(mut self, callback: Arc<dyn Fn(&str) + Send + Sync>) -> Self {
        self.on_provider_start = Some(callback);
        self
    }
}

#[async_trait]
impl SttProvider for HedgedStt {
    async fn transcribe(&self, audio: &Path) -> Result<String, SttError> {
        let mut tasks: JoinSet<Attempt> = JoinSet::new();

        for entry in &self.entries {
            let name = entry.name.clone();
            let provider = Arc::clone(&entry.provider);
            let delay = entry.delay;
            let audio = audio.to_path_buf();
            let on_start = self.on_provider_start.clone();

            tasks.spawn(async move {
                if delay > Duration::ZERO {
                    tokio::time::sleep(delay).await;
                }
                if let Some(on_start) = &on_start {
                    on_start(&name);
                }
                match provider.transcribe(&audio).await {
                    Ok(transcript) => Attempt::Success { name, transcript },
                    Err(error) => Attempt::Failure { name, error },
                }
            });
        }

        let mut last_error: Option<SttError> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Attempt::Success { name, transcript }) => {
                    log::info!("hedged race winner: {name}");
                    tasks.abort_all();
                    return Ok(transcript);
                }
                Ok(Attempt::Failure { name, error }) => {
                    if !error.is_fallback_eligible() {
                        log::warn!("{name} failed: {error} — stopping hedge");
                        tasks.abort_all();
                        return Err(error);
                    }
                    log::warn!("{name} failed: {error} — waiting for other hedges");
                    last_error = Some(error);
                }
                Err(join_error) => {
                    // Aborted tasks only appear after the race is decided;
                    // a panic inside an attempt counts as that entry failing.
                    if join_error.is_panic() {
                        last_error = Some(SttError::Unknown(format!(
                            "hedged attempt panicked: {join_error}"
                        )));
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SttError::Unknown("no STT providers available".into())))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::ScriptedStt;

    fn audio() -> &'static Path {
        Path::new("/tmp/recording.wav")
    }

    #[tokio::test(start_paused = true)]
    async fn fastest_success_wins_and_loser_is_aborted() {
        let slow = Arc::new(ScriptedStt::ok("slow").with_delay(Duration::from_millis(50)));
        let fast = Arc::new(ScriptedStt::ok("fast").with_delay(Duration::from_millis(10)));
        let race = HedgedStt::new(vec![
            HedgedEntry::new("slow", Arc::clone(&slow) as Arc<dyn SttProvider>, Duration::ZERO),
            HedgedEntry::new("fast", Arc::clone(&fast) as Arc<dyn SttProvider>, Duration::ZERO),
        ]);

        assert_eq!(race.transcribe(audio()).await.unwrap(), "fast");
        // Both started; the slow attempt was cancelled mid-sleep so its
        // result never surfaced.
        assert_eq!(slow.calls(), 1);
        assert_eq!(fast.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stagger_delay_holds_back_the_second_entry() {
        let primary = Arc::new(ScriptedStt::ok("primary").with_delay(Duration::from_millis(20)));
        let hedge = Arc::new(ScriptedStt::ok("hedge"));
        let race = HedgedStt::new(vec![
            HedgedEntry::new("primary", Arc::clone(&primary) as Arc<dyn SttProvider>, Duration::ZERO),
            HedgedEntry::new(
                "hedge",
                Arc::clone(&hedge) as Arc<dyn SttProvider>,
                Duration::from_millis(200),
            ),
        ]);

        // Primary resolves at 20ms, well before the hedge's 200ms stagger.
        assert_eq!(race.transcribe(audio()).await.unwrap(), "primary");
        assert_eq!(hedge.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn race_waits_out_eligible_failures() {
        let failing = Arc::new(ScriptedStt::err(SttError::Network("down".into())));
        let slow_ok = Arc::new(ScriptedStt::ok("eventually").with_delay(Duration::from_millis(80)));
        let race = HedgedStt::new(vec![
            HedgedEntry::new("failing", Arc::clone(&failing) as Arc<dyn SttProvider>, Duration::ZERO),
            HedgedEntry::new("slow", Arc::clone(&slow_ok) as Arc<dyn SttProvider>, Duration::ZERO),
        ]);

        assert_eq!(race.transcribe(audio()).await.unwrap(), "eventually");
    }

    #[tokio::test(start_paused = true)]
    async fn ineligible_failure_kills_the_whole_race() {
        let bad_audio = Arc::new(ScriptedStt::err(SttError::InvalidAudio));
        let never_needed =
            Arc::new(ScriptedStt::ok("unused").with_delay(Duration::from_secs(10)));
        let race = HedgedStt::new(vec![
            HedgedEntry::new("bad", Arc::clone(&bad_audio) as Arc<dyn SttProvider>, Duration::ZERO),
            HedgedEntry::new(
                "other",
                Arc::clone(&never_needed) as Arc<dyn SttProvider>,
                Duration::ZERO,
            ),
        ]);

        let started = tokio::time::Instant::now();
        let err = race.transcribe(audio()).await.unwrap_err();
        assert_eq!(err, SttError::InvalidAudio);
        // The race resolved immediately instead of waiting 10s for "other".
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn all_failures_surface_an_error() {
        let race = HedgedStt::new(vec![
            HedgedEntry::new(
                "a",
                Arc::new(ScriptedStt::err(SttError::Network("a down".into()))) as Arc<dyn SttProvider>,
                Duration::ZERO,
            ),
            HedgedEntry::new(
                "b",
                Arc::new(ScriptedStt::err(SttError::Throttled)) as Arc<dyn SttProvider>,
                Duration::from_millis(5),
            ),
        ]);

        assert!(race.transcribe(audio()).await.is_err());
    }

    #[test]
    #[should_panic(expected = "duplicate entry name")]
    fn duplicate_names_are_rejected_at_construction() {
        let _ = HedgedStt::new(vec![
            HedgedEntry::new("same", Arc::new(ScriptedStt::ok("a")), Duration::ZERO),
            HedgedEntry::new(" same ", Arc::new(ScriptedStt::ok("b")), Duration::ZERO),
        ]);
    }
}
