//! Pipeline orchestrator — drives the full audio → STT → rewrite → paste loop.
//!
//! # Pipeline flow
//!
//! ```text
//! process_audio(path)
//!   ├─▶ empty capture check                        [EmptyCapture]
//!   ├─▶ optional re-encode (best effort)           [encode_fallback → original file]
//!   ├─▶ STT under the overall deadline             [PipelineTimeout]
//!   └─▶ rewrite tail
//!         ├─ level = Raw  → skip rewrite
//!         ├─ cache hit    → cached text
//!         ├─ rewrite ok   → quality gate → accept / raw fallback
//!         └─ rewrite slow / failed / empty → raw fallback
//!       └─▶ paste
//! ```
//!
//! The rewrite stage never fails the run: every degraded outcome falls back
//! to the raw transcript and is tagged in the diagnostics stream. Only
//! transcription itself (or pasting) can surface an error to the caller.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::PipelineSettings;
use crate::level::ProcessingLevel;
use crate::provider::{
    AudioEncoder, PipelineError, PreferencesReading, RewriteProvider, SttProvider, TextPaster,
};
use crate::rewrite::cache::RewriteResultCache;
use crate::rewrite::{prompt, quality};
use crate::stream::StreamingAudioBridge;

use super::timing::PipelineTiming;

// ---------------------------------------------------------------------------
// Callback types
// ---------------------------------------------------------------------------

/// Receives the timing breakdown of every run, success or error.
pub type TimingSink = Arc<dyn Fn(&PipelineTiming) + Send + Sync>;

/// Fire-and-forget diagnostics stream: `(event, message)`.
pub type DiagnosticsSink = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Observes every completed run: `(raw_transcript, final_text, level)`.
pub type ProcessedHook = Arc<dyn Fn(&str, &str, ProcessingLevel) + Send + Sync>;

// ---------------------------------------------------------------------------
// DictationPipeline
// ---------------------------------------------------------------------------

/// Drives one dictation recording through transcription, rewrite and paste.
///
/// All collaborators are constructor-injected trait objects, so the same
/// orchestrator runs against production HTTP providers and in-process test
/// doubles alike.
pub struct DictationPipeline {
    stt: Arc<dyn SttProvider>,
    rewriter: Arc<dyn RewriteProvider>,
    paster: Arc<dyn TextPaster>,
    encoder: Option<Arc<dyn AudioEncoder>>,
    cache: Arc<RewriteResultCache>,
    prefs: Arc<dyn PreferencesReading>,
    settings: PipelineSettings,
    timing_sink: Option<TimingSink>,
    diagnostics: Option<DiagnosticsSink>,
    on_processed: Option<ProcessedHook>,
}

impl DictationPipeline {
    pub fn new(
        stt: Arc<dyn SttProvider>,
        rewriter: Arc<dyn RewriteProvider>,
        paster: Arc<dyn TextPaster>,
        cache: Arc<RewriteResultCache>,
        prefs: Arc<dyn PreferencesReading>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            stt,
            rewriter,
            paster,
            encoder: None,
            cache,
            prefs,
            settings,
            timing_sink: None,
            diagnostics: None,
            on_processed: None,
        }
    }

    /// Re-encode large recordings before upload. Optional; failure never
    /// fails the run.
    pub fn with_encoder(mut self, encoder: Arc<dyn AudioEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn with_timing_sink(mut self, sink: TimingSink) -> Self {
        self.timing_sink = Some(sink);
        self
    }

    pub fn with_diagnostics(mut self, sink: DiagnosticsSink) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Hook for recovery stores and history UIs.
    pub fn with_processed_hook(mut self, hook: ProcessedHook) -> Self {
        self.on_processed = Some(hook);
        self
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Run the full pipeline on a recorded audio file.
    pub async fn process_audio(&self, audio: &Path) -> Result<String, PipelineError> {
        let mut timing = PipelineTiming::start();
        let result = self.run_audio(audio, &mut timing).await;
        self.emit_timing(&timing);
        result
    }

    /// Run the rewrite + paste tail on an already-transcribed recording,
    /// at the preferred level.
    pub async fn process_transcript(&self, transcript: &str) -> Result<String, PipelineError> {
        let level = self.prefs.processing_level();
        self.process_transcript_with(transcript, level, false, None).await
    }

    /// Rewrite + paste tail with full control: explicit level, optional
    /// cache bypass, and a pre-measured streaming finalize duration.
    pub async fn process_transcript_with(
        &self,
        transcript: &str,
        level: ProcessingLevel,
        bypass_cache: bool,
        finalize_time: Option<Duration>,
    ) -> Result<String, PipelineError> {
        let mut timing = PipelineTiming::start();
        timing.finalize = finalize_time;
        let result = self
            .run_tail(transcript, level, bypass_cache, &mut timing)
            .await;
        self.emit_timing(&timing);
        result
    }

    /// Finalize a streaming session, falling back to batch transcription of
    /// the recorded file when streaming cannot deliver a transcript.
    pub async fn process_with_streaming_fallback(
        &self,
        bridge: &StreamingAudioBridge,
        audio: &Path,
    ) -> Result<String, PipelineError> {
        let level = self.prefs.processing_level();
        let finalize_started = Instant::now();

        match bridge.finish().await {
            Ok(transcript) if !transcript.trim().is_empty() => {
                let finalize_time = finalize_started.elapsed();
                self.diag("streaming_success", transcript.trim());
                self.process_transcript_with(transcript.trim(), level, false, Some(finalize_time))
                    .await
            }
            Ok(_) => {
                // Streamed but heard nothing final; the whole recording is
                // still on disk.
                self.diag("streaming_empty_batch_fallback", "");
                bridge.cancel().await;
                self.process_audio(audio).await
            }
            Err(error) if !error.is_fallback_eligible() => {
                self.diag("streaming_aborted", error.reason_code());
                bridge.cancel().await;
                Err(PipelineError::Internal(error.to_string()))
            }
            Err(error) => {
                log::warn!("streaming failed ({error}), retrying as batch upload");
                self.diag("streaming_batch_fallback", error.reason_code());
                bridge.cancel().await;
                self.process_audio(audio).await
            }
        }
    }

    // -----------------------------------------------------------------------
    // Stages
    // -----------------------------------------------------------------------

    async fn run_audio(
        &self,
        audio: &Path,
        timing: &mut PipelineTiming,
    ) -> Result<String, PipelineError> {
        // ── 1. Capture sanity check ──────────────────────────────────────
        let original_bytes = std::fs::metadata(audio).map(|m| m.len()).unwrap_or(0);
        if original_bytes == 0 {
            return Err(PipelineError::EmptyCapture);
        }
        timing.original_bytes = Some(original_bytes);

        // ── 2. Optional re-encode (best effort) ──────────────────────────
        let upload = self.encode_for_upload(audio, original_bytes, timing).await;

        // ── 3. Transcription under the overall deadline ──────────────────
        let stt_started = Instant::now();
        let transcript = tokio::time::timeout(
            self.settings.pipeline_timeout(),
            self.stt.transcribe(&upload),
        )
        .await
        .map_err(|_| PipelineError::PipelineTimeout)??;
        timing.stt = Some(stt_started.elapsed());

        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(PipelineError::NoTranscript);
        }
        log::debug!("pipeline: transcript = {transcript:?}");

        // ── 4. Rewrite + paste tail ──────────────────────────────────────
        let level = self.prefs.processing_level();
        self.run_tail(transcript, level, false, timing).await
    }

    /// Re-encode when an encoder is configured and the recording is large
    /// enough to be worth it. Any failure falls back to the original file.
    async fn encode_for_upload(
        &self,
        audio: &Path,
        original_bytes: u64,
        timing: &mut PipelineTiming,
    ) -> std::path::PathBuf {
        let encoder = match &self.encoder {
            Some(encoder) if original_bytes >= self.settings.encode_bypass_threshold_bytes => {
                encoder
            }
            _ => return audio.to_path_buf(),
        };

        let encode_started = Instant::now();
        match encoder.convert_to_upload_format(audio).await {
            Ok(encoded) => {
                let encoded_bytes = std::fs::metadata(&encoded).map(|m| m.len()).unwrap_or(0);
                if encoded_bytes == 0 {
                    log::warn!("encoder produced an empty file, uploading original");
                    self.diag("encode_fallback", "empty encoder output");
                    return audio.to_path_buf();
                }
                timing.encode = Some(encode_started.elapsed());
                timing.encoded_bytes = Some(encoded_bytes);
                encoded
            }
            Err(reason) => {
                log::warn!("encode failed ({reason}), uploading original");
                self.diag("encode_fallback", &reason);
                audio.to_path_buf()
            }
        }
    }

    async fn run_tail(
        &self,
        raw: &str,
        level: ProcessingLevel,
        bypass_cache: bool,
        timing: &mut PipelineTiming,
    ) -> Result<String, PipelineError> {
        timing.level = Some(level);

        let output = if level == ProcessingLevel::Raw {
            raw.to_string()
        } else {
            let rewrite_started = Instant::now();
            let rewritten = self.rewrite_stage(raw, level, bypass_cache).await;
            timing.rewrite = Some(rewrite_started.elapsed());
            rewritten
        };

        let output = output.trim().to_string();
        if output.is_empty() {
            return Err(PipelineError::NoTranscript);
        }

        let paste_started = Instant::now();
        self.paster.paste(&output).await?;
        timing.paste = Some(paste_started.elapsed());

        if let Some(hook) = &self.on_processed {
            hook(raw, &output, level);
        }
        Ok(output)
    }

    /// Rewrite `raw` at `level`, degrading to the raw transcript on any
    /// failure. Never returns an error.
    async fn rewrite_stage(&self, raw: &str, level: ProcessingLevel, bypass_cache: bool) -> String {
        let model = &self.settings.rewrite.model;

        if !bypass_cache {
            if let Some(cached) = self.cache.get(raw, level, model).await {
                self.diag("cache_hit", &cached);
                return cached;
            }
        }

        let system_prompt = prompt::prompt_with_context(level, raw);
        // Raw is filtered out in run_tail, so a timeout always exists here.
        let timeout = self
            .settings
            .rewrite_timeout(level)
            .unwrap_or(Duration::from_secs(30));

        let candidate = match tokio::time::timeout(
            timeout,
            self.rewriter.rewrite(raw, &system_prompt, model),
        )
        .await
        {
            Err(_) => {
                log::warn!("rewrite timed out after {timeout:?}, using raw transcript");
                self.diag("timeout_raw_fallback", "");
                return raw.to_string();
            }
            Ok(Err(error)) => {
                log::warn!("rewrite failed ({error}), using raw transcript");
                self.diag("error_raw_fallback", &error.to_string());
                return raw.to_string();
            }
            Ok(Ok(candidate)) => candidate.trim().to_string(),
        };

        if candidate.is_empty() {
            log::warn!("rewrite returned empty text, using raw transcript");
            self.diag("empty_raw_fallback", "");
            return raw.to_string();
        }

        let decision = quality::evaluate(raw, &candidate, level);
        if !decision.is_acceptable {
            log::warn!(
                "rewrite rejected by quality gate (ratio {:.2} < {:.2}), using raw transcript",
                decision.ratio,
                decision.minimum_ratio
            );
            self.diag("gate_rejected_raw_fallback", &format!("{:.2}", decision.ratio));
            return raw.to_string();
        }

        self.cache.insert(raw, level, model, &candidate).await;
        self.diag("success", &candidate);
        candidate
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn emit_timing(&self, timing: &PipelineTiming) {
        log::info!("pipeline: {}", timing.summary());
        if let Some(sink) = &self.timing_sink {
            sink(timing);
        }
    }

    fn diag(&self, event: &str, message: &str) {
        if let Some(sink) = &self.diagnostics {
            sink(event, message);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
