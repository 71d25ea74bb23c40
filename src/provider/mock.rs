//! Test doubles for the provider traits.
//!
//! Compiled only for tests, mirroring the scripted-response style of the
//! production mocks: a queue of canned results, call counting, and optional
//! artificial latency so timing combinators can be exercised under tokio's
//! paused clock.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::provider::error::{RewriteError, SttError};
use crate::provider::traits::{RewriteProvider, SttProvider};

// ---------------------------------------------------------------------------
// ScriptedStt
// ---------------------------------------------------------------------------

/// STT double that replays a queue of canned results.
///
/// When the queue runs dry the last result is repeated, so
/// `ScriptedStt::ok("hi")` behaves as an always-succeeding provider.
pub struct ScriptedStt {
    script: Mutex<Vec<Result<String, SttError>>>,
    last: Mutex<Result<String, SttError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedStt {
    pub fn new(script: Vec<Result<String, SttError>>) -> Self {
        assert!(!script.is_empty(), "script must not be empty");
        let last = script.last().cloned().unwrap();
        let mut queue = script;
        queue.reverse(); // pop() from the back = front of the script
        Self {
            script: Mutex::new(queue),
            last: Mutex::new(last),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn ok(text: impl Into<String>) -> Self {
        Self::new(vec![Ok(text.into())])
    }

    pub fn err(error: SttError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Succeed (or fail) only after `delay` of tokio time has elapsed.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SttProvider for ScriptedStt {
    async fn transcribe(&self, _audio: &Path) -> Result<String, SttError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.script.lock().unwrap().pop() {
            Some(result) => {
                *self.last.lock().unwrap() = result.clone();
                result
            }
            None => self.last.lock().unwrap().clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// PendingStt
// ---------------------------------------------------------------------------

/// STT double whose `transcribe` never resolves — for timeout races.
pub struct PendingStt {
    calls: AtomicUsize,
}

impl PendingStt {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SttProvider for PendingStt {
    async fn transcribe(&self, _audio: &Path) -> Result<String, SttError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
        unreachable!("pending future resolved")
    }
}

// ---------------------------------------------------------------------------
// ScriptedRewrite
// ---------------------------------------------------------------------------

/// Rewrite double: one fixed result, records the last model id it was given.
pub struct ScriptedRewrite {
    result: Result<String, RewriteError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_model: Mutex<Option<String>>,
}

impl ScriptedRewrite {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            result: Ok(text.into()),
            delay: None,
            calls: AtomicUsize::new(0),
            last_model: Mutex::new(None),
        }
    }

    pub fn err(error: RewriteError) -> Self {
        Self {
            result: Err(error),
            delay: None,
            calls: AtomicUsize::new(0),
            last_model: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_model(&self) -> Option<String> {
        self.last_model.lock().unwrap().clone()
    }
}

#[async_trait]
impl RewriteProvider for ScriptedRewrite {
    async fn rewrite(
        &self,
        _transcript: &str,
        _system_prompt: &str,
        model: &str,
    ) -> Result<String, RewriteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_model.lock().unwrap() = Some(model.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}
