//! Concurrency cap for STT calls.
//!
//! Wraps a provider behind a semaphore so at most `limit` transcriptions run
//! at once; extra callers queue in arrival order. A caller that gives up
//! while waiting simply drops its acquire future and releases nothing.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::provider::{SttError, SttProvider};

// ---------------------------------------------------------------------------
// ConcurrencyLimitedStt
// ---------------------------------------------------------------------------

pub struct ConcurrencyLimitedStt {
    provider: Arc<dyn SttProvider>,
    permits: Semaphore,
}

impl ConcurrencyLimitedStt {
    /// # Panics
    /// Panics if `limit` is zero.
    pub fn new(provider: Arc<dyn SttProvider>, limit: usize) -> Self {
        assert!(limit > 0, "concurrency limit must be at least 1");
        Self {
            provider,
            permits: Semaphore::new(limit),
        }
    }

    /// Permits currently free; for diagnostics.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

#[async_trait]
impl SttProvider for ConcurrencyLimitedStt {
    async fn transcribe(&self, audio: &Path) -> Result<String, SttError> {
        // The semaphore is never closed, so acquire can only fail if it were.
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| SttError::Unknown("concurrency limiter closed".into()))?;
        self.provider.transcribe(audio).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::ScriptedStt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn audio() -> &'static Path {
        Path::new("/tmp/recording.wav")
    }

    #[tokio::test(start_paused = true)]
    async fn limits_in_flight_calls() {
        struct GaugedStt {
            in_flight: AtomicUsize,
            peak: AtomicUsize,
        }

        #[async_trait]
        impl SttProvider for GaugedStt {
            async fn transcribe(&self, _audio: &Path) -> Result<String, SttError> {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok("done".into())
            }
        }

        let gauged = Arc::new(GaugedStt {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let limited = Arc::new(ConcurrencyLimitedStt::new(
            Arc::clone(&gauged) as Arc<dyn SttProvider>,
            2,
        ));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let limited = Arc::clone(&limited);
            handles.push(tokio::spawn(async move { limited.transcribe(audio()).await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "done");
        }

        assert!(gauged.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(limited.available_permits(), 2);
    }

    #[tokio::test]
    async fn errors_release_the_permit() {
        let limited = ConcurrencyLimitedStt::new(
            Arc::new(ScriptedStt::err(SttError::Network("down".into()))),
            1,
        );
        assert!(limited.transcribe(audio()).await.is_err());
        assert_eq!(limited.available_permits(), 1);
    }

    #[test]
    #[should_panic(expected = "at least 1")]
    fn zero_limit_is_rejected() {
        let _ = ConcurrencyLimitedStt::new(Arc::new(ScriptedStt::ok("hi")), 0);
    }
}
