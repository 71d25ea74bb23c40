//! Result cache for accepted rewrites.
//!
//! Dictating the same short phrase twice within a few minutes should not
//! cost a second model call. Entries are keyed on the exact raw transcript
//! plus the level and model that produced the rewrite; anything long enough
//! to be unlikely to repeat verbatim is not cached at all.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::level::ProcessingLevel;

/// Most entries the cache will hold.
pub const DEFAULT_CACHE_CAPACITY: usize = 128;
/// How long an entry stays usable.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);
/// Transcripts or rewrites longer than this are never cached.
pub const DEFAULT_CACHE_MAX_CHARS: usize = 1024;

// ---------------------------------------------------------------------------
// RewriteResultCache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    transcript: String,
    level: ProcessingLevel,
    model: String,
}

#[derive(Debug)]
struct CacheEntry {
    rewritten: String,
    created_at: Instant,
}

/// TTL-bounded cache of `(transcript, level, model) → rewritten text`.
pub struct RewriteResultCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    capacity: usize,
    ttl: Duration,
    max_chars: usize,
}

impl Default for RewriteResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL, DEFAULT_CACHE_MAX_CHARS)
    }
}

impl RewriteResultCache {
    /// # Panics
    /// Panics if `capacity` or `max_chars` is zero.
    pub fn new(capacity: usize, ttl: Duration, max_chars: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be at least 1");
        assert!(max_chars > 0, "cache char ceiling must be at least 1");
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
            ttl,
            max_chars,
        }
    }

    pub async fn get(
        &self,
        transcript: &str,
        level: ProcessingLevel,
        model: &str,
    ) -> Option<String> {
        let mut entries = self.entries.lock().await;
        Self::prune_expired(&mut entries, self.ttl);
        let key = CacheKey {
            transcript: transcript.to_string(),
            level,
            model: model.to_string(),
        };
        entries.get(&key).map(|entry| entry.rewritten.clone())
    }

    /// Store an accepted rewrite. Oversized inputs are silently skipped.
    pub async fn insert(
        &self,
        transcript: &str,
        level: ProcessingLevel,
        model: &str,
        rewritten: &str,
    ) {
        if transcript.chars().count() > self.max_chars
            || rewritten.chars().count() > self.max_chars
        {
            return;
        }

        let mut entries = self.entries.lock().await;
        Self::prune_expired(&mut entries, self.ttl);

        let key = CacheKey {
            transcript: transcript.to_string(),
            level,
            model: model.to_string(),
        };
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            // Evict the single oldest entry to make room.
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(key, _)| key.clone())
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            CacheEntry {
                rewritten: rewritten.to_string(),
                created_at: Instant::now(),
            },
        );
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn prune_expired(entries: &mut HashMap<CacheKey, CacheEntry>, ttl: Duration) {
        let now = Instant::now();
        entries.retain(|_, entry| now.duration_since(entry.created_at) < ttl);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: ProcessingLevel = ProcessingLevel::Clean;
    const MODEL: &str = "gemini-2.5-flash-lite";

    #[tokio::test]
    async fn hit_requires_exact_key() {
        let cache = RewriteResultCache::default();
        cache.insert("hello world", LEVEL, MODEL, "Hello, world.").await;

        assert_eq!(
            cache.get("hello world", LEVEL, MODEL).await.as_deref(),
            Some("Hello, world.")
        );
        assert!(cache.get("hello world", ProcessingLevel::Polish, MODEL).await.is_none());
        assert!(cache.get("hello world", LEVEL, "other-model").await.is_none());
        assert!(cache.get("hello  world", LEVEL, MODEL).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = RewriteResultCache::new(8, Duration::from_secs(600), 1024);
        cache.insert("phrase", LEVEL, MODEL, "Phrase.").await;

        tokio::time::advance(Duration::from_secs(599)).await;
        assert!(cache.get("phrase", LEVEL, MODEL).await.is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("phrase", LEVEL, MODEL).await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn capacity_evicts_only_the_oldest() {
        let cache = RewriteResultCache::new(2, Duration::from_secs(600), 1024);
        cache.insert("first", LEVEL, MODEL, "First.").await;
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.insert("second", LEVEL, MODEL, "Second.").await;
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.insert("third", LEVEL, MODEL, "Third.").await;

        assert!(cache.get("first", LEVEL, MODEL).await.is_none());
        assert!(cache.get("second", LEVEL, MODEL).await.is_some());
        assert!(cache.get("third", LEVEL, MODEL).await.is_some());
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn rewriting_same_key_replaces_without_eviction() {
        let cache = RewriteResultCache::new(1, Duration::from_secs(600), 1024);
        cache.insert("phrase", LEVEL, MODEL, "Old.").await;
        cache.insert("phrase", LEVEL, MODEL, "New.").await;
        assert_eq!(cache.get("phrase", LEVEL, MODEL).await.as_deref(), Some("New."));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn oversized_text_is_never_cached() {
        let cache = RewriteResultCache::default();
        let long = "x".repeat(DEFAULT_CACHE_MAX_CHARS + 1);

        cache.insert(&long, LEVEL, MODEL, "short").await;
        cache.insert("short", LEVEL, MODEL, &long).await;
        assert!(cache.is_empty().await);

        let at_limit = "x".repeat(DEFAULT_CACHE_MAX_CHARS);
        cache.insert(&at_limit, LEVEL, MODEL, "ok").await;
        assert_eq!(cache.len().await, 1);
    }
}
