//! Health-ranked STT fallback.
//!
//! Like the plain fallback chain, but the attempt order is recomputed per
//! call from a sliding window of recent outcomes. Providers with recent
//! permanent failures sink to the bottom; among the rest, higher success
//! rate wins, then fewer transient failures, then lower mean latency, and
//! declaration order breaks remaining ties so behavior stays deterministic
//! from a cold start.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::provider::{FailureClass, SttError, SttProvider};

/// Outcomes remembered per provider.
pub const HEALTH_WINDOW: usize = 20;

const LATENCY_EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Health store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Sample {
    success: bool,
    latency: Duration,
    failure_class: Option<FailureClass>,
}

#[derive(Debug, Default)]
struct ProviderHealth {
    samples: VecDeque<Sample>,
}

impl ProviderHealth {
    fn record(&mut self, sample: Sample) {
        if self.samples.len() == HEALTH_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// An unsampled provider is presumed healthy.
    fn success_rate(&self) -> f64 {
        if self.samples.is_empty() {
            return 1.0;
        }
        let successes = self.samples.iter().filter(|s| s.success).count();
        successes as f64 / self.samples.len() as f64
    }

    fn permanent_failures(&self) -> usize {
        self.samples
            .iter()
            .filter(|s| s.failure_class == Some(FailureClass::Permanent))
            .count()
    }

    fn transient_failures(&self) -> usize {
        self.samples
            .iter()
            .filter(|s| s.failure_class == Some(FailureClass::Transient))
            .count()
    }

    fn mean_latency(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: f64 = self.samples.iter().map(|s| s.latency.as_secs_f64()).sum();
        total / self.samples.len() as f64
    }
}

/// A point-in-time view of one provider's recent history.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthSnapshot {
    pub name: String,
    pub samples: usize,
    pub success_rate: f64,
    pub permanent_failures: usize,
    pub transient_failures: usize,
    pub mean_latency: Duration,
}

// ---------------------------------------------------------------------------
// HealthRankedStt
// ---------------------------------------------------------------------------

pub struct HealthEntry {
    pub name: String,
    pub provider: Arc<dyn SttProvider>,
}

impl HealthEntry {
    pub fn new(name: impl Into<String>, provider: Arc<dyn SttProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }
}

/// Fallback chain whose order follows recent provider health.
pub struct HealthRankedStt {
    entries: Vec<HealthEntry>,
    health: Mutex<Vec<ProviderHealth>>,
    on_switch: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

impl HealthRankedStt {
    /// # Panics
    /// Panics if `entries` is empty.
    pub fn new(entries: Vec<HealthEntry>) -> Self {
        assert!(
            !entries.is_empty(),
            "HealthRankedStt requires at least one entry"
        );
        let health = (0..entries.len()).map(|_| ProviderHealth::default()).collect();
        Self {
            entries,
            health: Mutex::new(health),
            on_switch: None,
        }
    }

    /// Hook invoked with the chosen entry's name whenever an attempt starts
    /// with a provider that is not the first-declared one.
    pub fn with_switch_callback(mut self, callback: Arc<dyn Fn(&str) + Send + Sync>) -> Self {
        self.on_switch = Some(callback);
        self
    }

    /// Entry indices ordered best-first.
    async fn ranked_order(&self) -> Vec<usize> {
        let health = self.health.lock().await;
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by(|&a, &b| {
            let (ha, hb) = (&health[a], &health[b]);
            ha.permanent_failures()
                .cmp(&hb.permanent_failures())
                .then_with(|| {
                    hb.success_rate()
                        .partial_cmp(&ha.success_rate())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| ha.transient_failures().cmp(&hb.transient_failures()))
                .then_with(|| {
                    let (la, lb) = (ha.mean_latency(), hb.mean_latency());
                    if (la - lb).abs() < LATENCY_EPSILON {
                        std::cmp::Ordering::Equal
                    } else {
                        la.partial_cmp(&lb).unwrap_or(std::cmp::Ordering::Equal)
                    }
                })
                .then_with(|| a.cmp(&b))
        });
        order
    }

    async fn record(&self, index: usize, sample: Sample) {
        self.health.lock().await[index].record(sample);
    }

    /// Current health of every provider, in declaration order.
    pub async fn health_snapshot(&self) -> Vec<HealthSnapshot> {
        let health = self.health.lock().await;
        self.entries
            .iter()
            .zip(health.iter())
            .map(|(entry, h)| HealthSnapshot {
                name: entry.name.clone(),
                samples: h.samples.len(),
                success_rate: h.success_rate(),
                permanent_failures: h.permanent_failures(),
                transient_failures: h.transient_failures(),
                mean_latency: Duration::from_secs_f64(h.mean_latency()),
            })
            .collect()
    }
}

#[async_trait]
impl SttProvider for HealthRankedStt {
    async fn transcribe(&self, audio: &Path) -> Result<String, SttError> {
        let order = self.ranked_order().await;
        let mut last_error: Option<SttError> = None;

        for index in order {
            let entry = &self.entries[index];
            if index != 0 {
                if let Some(on_switch) = &self.on_switch {
                    on_switch(&entry.name);
                }
            }

            let started = Instant::now();
            match entry.provider.transcribe(audio).await {
                Ok(transcript) => {
                    self.record(
                        index,
                        Sample {
                            success: true,
                            latency: started.elapsed(),
                            failure_class: None,
                        },
                    )
                    .await;
                    return Ok(transcript);
                }
                Err(error) => {
                    self.record(
                        index,
                        Sample {
                            success: false,
                            latency: started.elapsed(),
                            failure_class: Some(error.failure_class()),
                        },
                    )
                    .await;
                    if !error.is_fallback_eligible() {
                        log::warn!("{} failed: {error} — not trying others", entry.name);
                        return Err(error);
                    }
                    log::warn!("{} failed: {error} — trying next-healthiest", entry.name);
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SttError::Unknown("no STT providers available".into())))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
