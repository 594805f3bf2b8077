use std::sync::Arc;
use std::time::Duration;

use babblefish_config::Settings;
use babblefish_pipeline::asr::deterministic::DeterministicAsrBackend;
use babblefish_pipeline::translate::identity::IdentityTranslationBackend;
use babblefish_pipeline::translate::remote_http::RemoteHttpTranslationBackend;
use babblefish_pipeline::{AsrBackend, InferencePipeline, LanguageRegistry, PipelineConfig, TranslationBackend};
use tracing::warn;

use crate::room_manager::RoomManager;

#[derive(Clone)]
pub struct AppState {
    pub room_manager: Arc<RoomManager>,
    pub registry: Arc<LanguageRegistry>,
    pub idle_connection_timeout: Duration,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        let registry = Arc::new(LanguageRegistry::default());

        let pipeline_config = PipelineConfig {
            asr_backend: settings.pipeline.asr_backend.clone(),
            whisper_model_path: settings.pipeline.whisper_model_path.clone(),
            translation_backend: settings.pipeline.translation_backend.clone(),
            translation_endpoint: settings.pipeline.translation_endpoint.clone(),
            language: settings.pipeline.language.clone(),
            pipeline_permits: settings.pipeline.pipeline_permits,
            utterance_hard_cap_seconds: settings.pipeline.utterance_hard_cap_seconds,
            utterance_deadline_ms: settings.pipeline.utterance_deadline_ms,
            device: settings.pipeline.device.clone(),
            compute_type: settings.pipeline.compute_type.clone(),
        };

        let asr = create_asr_backend(&pipeline_config);
        let translator = create_translation_backend(&pipeline_config);

        let pipeline = InferencePipeline::new(asr, translator, Arc::clone(&registry), pipeline_config);

        let room_manager = RoomManager::new(
            settings.room.clone(),
            settings.pipeline.utterance_hard_cap_seconds,
            Arc::clone(&registry),
            pipeline,
        );

        let idle_connection_timeout =
            Duration::from_secs(settings.room.idle_connection_timeout_seconds);

        Self {
            room_manager,
            registry,
            idle_connection_timeout,
        }
    }
}

fn create_asr_backend(config: &PipelineConfig) -> Arc<dyn AsrBackend> {
    match config.asr_backend.as_str() {
        #[cfg(feature = "local-whisper")]
        "local_whisper" => {
            let model_path = config
                .whisper_model_path
                .as_deref()
                .unwrap_or("models/ggml-base.en.bin");
            match babblefish_pipeline::asr::local_whisper::LocalWhisperBackend::new(
                model_path,
                config.language.clone(),
            ) {
                Ok(backend) => Arc::new(backend),
                Err(e) => {
                    warn!(error = %e, "failed to load local_whisper backend, falling back to deterministic");
                    Arc::new(DeterministicAsrBackend)
                }
            }
        }
        other => {
            if other != "deterministic" {
                warn!(requested = other, "unknown asr backend, using deterministic");
            }
            Arc::new(DeterministicAsrBackend)
        }
    }
}

fn create_translation_backend(config: &PipelineConfig) -> Arc<dyn TranslationBackend> {
    match config.translation_backend.as_str() {
        "remote_http" => match &config.translation_endpoint {
            Some(endpoint) => Arc::new(RemoteHttpTranslationBackend::new(endpoint.clone())),
            None => {
                warn!("remote_http translation backend requested without an endpoint, using identity");
                Arc::new(IdentityTranslationBackend)
            }
        },
        other => {
            if other != "identity" {
                warn!(requested = other, "unknown translation backend, using identity");
            }
            Arc::new(IdentityTranslationBackend)
        }
    }
}
