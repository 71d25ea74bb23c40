//! Rewrite stage: prompts, model routing, quality gating, result caching.

pub mod cache;
pub mod prompt;
pub mod quality;
pub mod routed;

pub use cache::{
    RewriteResultCache, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_MAX_CHARS, DEFAULT_CACHE_TTL,
};
pub use prompt::{prompt_for, prompt_with_context};
pub use quality::{evaluate, GateDecision};
pub use routed::ModelRoutedRewrite;
