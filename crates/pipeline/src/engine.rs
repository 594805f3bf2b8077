use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::asr::{AsrBackend, AsrRequest};
use crate::config::PipelineConfig;
use crate::registry::LanguageRegistry;
use crate::translate::TranslationBackend;
use crate::{PipelineError, PipelineResult};

/// Serializes ASR + Translation across every Room sharing this pipeline.
///
/// A `tokio::sync::Semaphore` with `pipeline_permits` permits (default 1)
/// guards one `transcribe_and_translate` call at a time. Multiple Rooms hold
/// an `Arc<InferencePipeline>` and queue on the same semaphore, which is the
/// backpressure mechanism: a Room blocked on `acquire` is visibly waiting,
/// not silently dropping audio.
pub struct InferencePipeline {
    asr: Arc<dyn AsrBackend>,
    translator: Arc<dyn TranslationBackend>,
    registry: Arc<LanguageRegistry>,
    permits: Semaphore,
    config: PipelineConfig,
}

impl InferencePipeline {
    pub fn new(
        asr: Arc<dyn AsrBackend>,
        translator: Arc<dyn TranslationBackend>,
        registry: Arc<LanguageRegistry>,
        config: PipelineConfig,
    ) -> Arc<Self> {
        let permits = config.pipeline_permits.max(1);
        debug!(permits, asr = asr.name(), translator = translator.name(), "inference pipeline ready");
        Arc::new(Self {
            asr,
            translator,
            registry,
            permits: Semaphore::new(permits),
            config,
        })
    }

    /// Permits currently free, i.e. not held by an in-flight
    /// `transcribe_and_translate` call. Exposed only for health/diagnostic
    /// reporting — callers must not branch on it before calling.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Runs ASR then fan-out translation for one finalized utterance.
    ///
    /// `declared_short` is the speaker's declared language (short tag).
    /// `target_shorts` is the snapshot of other participants' languages the
    /// Room took when the utterance was finalized — the pipeline does not
    /// compute this set itself.
    pub async fn transcribe_and_translate(
        &self,
        audio_pcm_16k_mono: Vec<f32>,
        declared_short: &str,
        target_shorts: &[String],
    ) -> Result<PipelineResult, PipelineError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .expect("pipeline semaphore never closes");

        let declared_model = self
            .registry
            .resolve(declared_short)
            .map_err(|_| PipelineError::UnsupportedLanguage(declared_short.to_string()))?
            .to_string();

        let asr_call = self.asr.transcribe(AsrRequest {
            audio_pcm_16k_mono,
            language_hint: Some(declared_short.to_string()),
        });

        let asr_result = match self.config.utterance_deadline_ms {
            Some(ms) => tokio::time::timeout(std::time::Duration::from_millis(ms), asr_call)
                .await
                .map_err(|_| PipelineError::AsrFailed("transcription timed out".to_string()))?
                .map_err(|e| PipelineError::AsrFailed(e.to_string()))?,
            None => asr_call
                .await
                .map_err(|e| PipelineError::AsrFailed(e.to_string()))?,
        };

        // A detected language outside the registry falls back to the
        // speaker's declared language rather than failing the call.
        let (source_short, source_model) = match asr_result.detected_language.as_deref() {
            Some(detected) if self.registry.is_supported(detected) => (
                detected.to_string(),
                self.registry.resolve(detected).unwrap().to_string(),
            ),
            Some(detected) => {
                warn!(
                    detected,
                    declared = declared_short,
                    "asr detected an unsupported language, falling back to declared"
                );
                (declared_short.to_string(), declared_model)
            }
            None => (declared_short.to_string(), declared_model),
        };

        let mut translations = HashMap::with_capacity(target_shorts.len() + 1);
        translations.insert(source_short.clone(), asr_result.text.clone());

        let mut diagnostics = Vec::new();
        let mut produced = 0usize;
        let mut attempted = 0usize;

        for target_short in target_shorts {
            if *target_short == source_short {
                continue;
            }
            attempted += 1;
            let target_model = match self.registry.resolve(target_short) {
                Ok(model) => model,
                Err(_) => {
                    diagnostics.push(format!("unsupported target language: {target_short}"));
                    continue;
                }
            };

            match self
                .translator
                .translate(&asr_result.text, &source_model, target_model)
                .await
            {
                Ok(translated) => {
                    translations.insert(target_short.clone(), translated);
                    produced += 1;
                }
                Err(e) => {
                    diagnostics.push(format!("translation to {target_short} failed: {e}"));
                }
            }
        }

        if attempted > 0 && produced == 0 {
            return Err(PipelineError::TranslationFailed(
                "every target translation failed".to_string(),
            ));
        }

        Ok(PipelineResult {
            source_lang: source_short,
            source_text: asr_result.text,
            translations,
            diagnostics,
        })
    }
}
