//! Resilience combinators for STT and rewrite providers.
//!
//! Each wrapper implements the provider trait it wraps, so they compose in
//! any order: a typical production stack is retry → timeout → hedged race,
//! with a health-ranked fallback chain at the bottom.

pub mod fallback;
pub mod health;
pub mod hedged;
pub mod limit;
pub mod retry;
pub mod timeout;

pub use fallback::{FallbackRewrite, FallbackStt, RewriteEntry, SttEntry};
pub use health::{HealthEntry, HealthRankedStt, HealthSnapshot, HEALTH_WINDOW};
pub use hedged::{HedgedEntry, HedgedStt};
pub use limit::ConcurrencyLimitedStt;
pub use retry::RetryingStt;
pub use timeout::TimeoutStt;
