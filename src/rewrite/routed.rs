//! Model-id based routing between rewrite providers.
//!
//! Each backend speaks a different dialect of model ids: the Gemini direct
//! API wants bare ids like `gemini-2.5-flash-lite`, the OpenRouter-style
//! gateway wants provider-prefixed ids like `x-ai/grok-4.1-fast`, and the
//! Inception API only serves its own `mercury*` family. Sending an id to
//! the wrong backend is a guaranteed 404, so routing happens here, in one
//! place, with a cross-backend fallback when the preferred route fails.

use async_trait::async_trait;
use std::sync::Arc;

use crate::provider::{RewriteError, RewriteProvider};

// ---------------------------------------------------------------------------
// ModelRoutedRewrite
// ---------------------------------------------------------------------------

pub struct ModelRoutedRewrite {
    gemini: Option<Arc<dyn RewriteProvider>>,
    open_router: Option<Arc<dyn RewriteProvider>>,
    inception: Option<Arc<dyn RewriteProvider>>,
    /// Model handed to Gemini when it rescues a request for a model id it
    /// cannot serve itself.
    fallback_gemini_model: String,
}

impl ModelRoutedRewrite {
    pub fn new(
        gemini: Option<Arc<dyn RewriteProvider>>,
        open_router: Option<Arc<dyn RewriteProvider>>,
        inception: Option<Arc<dyn RewriteProvider>>,
        fallback_gemini_model: impl Into<String>,
    ) -> Self {
        Self {
            gemini,
            open_router,
            inception,
            fallback_gemini_model: fallback_gemini_model.into(),
        }
    }

    /// Bare Gemini id for a Gemini-family model, in either the direct form
    /// (`gemini-*`) or the gateway form (`google/gemini-*`).
    fn gemini_model_name(model: &str) -> Option<&str> {
        if model.starts_with("gemini-") {
            return Some(model);
        }
        model.strip_prefix("google/").filter(|bare| bare.starts_with("gemini-"))
    }

    fn is_mercury_model(model: &str) -> bool {
        model.starts_with("mercury")
    }

    async fn rewrite_gemini_family(
        &self,
        transcript: &str,
        system_prompt: &str,
        requested: &str,
        bare: &str,
    ) -> Result<String, RewriteError> {
        if let Some(gemini) = &self.gemini {
            log::debug!("rewrite route: gemini_direct requested={requested} target={bare}");
            match gemini.rewrite(transcript, system_prompt, bare).await {
                Ok(text) => return Ok(text),
                Err(error) => {
                    if let Some(open_router) = &self.open_router {
                        log::debug!(
                            "rewrite route: gemini_direct_to_gateway requested={requested} error={error}"
                        );
                        return open_router.rewrite(transcript, system_prompt, requested).await;
                    }
                    return Err(error);
                }
            }
        }
        if let Some(open_router) = &self.open_router {
            log::debug!("rewrite route: gemini_via_gateway requested={requested}");
            return open_router.rewrite(transcript, system_prompt, requested).await;
        }
        Err(RewriteError::Auth)
    }

    async fn rewrite_mercury(
        &self,
        transcript: &str,
        system_prompt: &str,
        requested: &str,
    ) -> Result<String, RewriteError> {
        if let Some(inception) = &self.inception {
            log::debug!("rewrite route: inception_primary requested={requested}");
            match inception.rewrite(transcript, system_prompt, requested).await {
                Ok(text) => return Ok(text),
                Err(error) => {
                    if let Some(gemini) = &self.gemini {
                        log::debug!(
                            "rewrite route: inception_to_gemini requested={requested} \
                             fallback_model={} error={error}",
                            self.fallback_gemini_model
                        );
                        return gemini
                            .rewrite(transcript, system_prompt, &self.fallback_gemini_model)
                            .await;
                    }
                    return Err(error);
                }
            }
        }
        if let Some(gemini) = &self.gemini {
            log::debug!(
                "rewrite route: no_inception_fallback_to_gemini requested={requested} \
                 fallback_model={}",
                self.fallback_gemini_model
            );
            return gemini
                .rewrite(transcript, system_prompt, &self.fallback_gemini_model)
                .await;
        }
        Err(RewriteError::Auth)
    }

    async fn rewrite_other(
        &self,
        transcript: &str,
        system_prompt: &str,
        requested: &str,
    ) -> Result<String, RewriteError> {
        if let Some(open_router) = &self.open_router {
            log::debug!("rewrite route: gateway_primary requested={requested}");
            match open_router.rewrite(transcript, system_prompt, requested).await {
                Ok(text) => return Ok(text),
                Err(error) => {
                    if let Some(gemini) = &self.gemini {
                        log::debug!(
                            "rewrite route: gateway_to_gemini requested={requested} \
                             fallback_model={} error={error}",
                            self.fallback_gemini_model
                        );
                        return gemini
                            .rewrite(transcript, system_prompt, &self.fallback_gemini_model)
                            .await;
                    }
                    return Err(error);
                }
            }
        }
        if let Some(gemini) = &self.gemini {
            log::debug!(
                "rewrite route: no_gateway_fallback_to_gemini requested={requested} \
                 fallback_model={}",
                self.fallback_gemini_model
            );
            return gemini
                .rewrite(transcript, system_prompt, &self.fallback_gemini_model)
                .await;
        }
        Err(RewriteError::Auth)
    }
}

#[async_trait]
impl RewriteProvider for ModelRoutedRewrite {
    async fn rewrite(
        &self,
        transcript: &str,
        system_prompt: &str,
        model: &str,
    ) -> Result<String, RewriteError> {
        if let Some(bare) = Self::gemini_model_name(model) {
            return self
                .rewrite_gemini_family(transcript, system_prompt, model, bare)
                .await;
        }
        if Self::is_mercury_model(model) {
            return self.rewrite_mercury(transcript, system_prompt, model).await;
        }
        self.rewrite_other(transcript, system_prompt, model).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
