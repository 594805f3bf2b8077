pub mod asr;
pub mod config;
pub mod engine;
pub mod pipeline;
pub mod registry;
pub mod translate;

pub use asr::{AsrBackend, AsrRequest, AsrResult};
pub use config::PipelineConfig;
pub use engine::InferencePipeline;
pub use registry::LanguageRegistry;
pub use translate::TranslationBackend;

use std::collections::HashMap;

use thiserror::Error;

/// Outcome of one `transcribe_and_translate` call.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Source language actually used (declared, or detected and confirmed
    /// supported), as a short tag.
    pub source_lang: String,
    /// The transcribed source text.
    pub source_text: String,
    /// Short tag -> translated text, always including `source_lang`
    /// mapped to the untranslated source text.
    pub translations: HashMap<String, String>,
    /// Non-fatal problems encountered (e.g. individual translation
    /// failures), surfaced to callers for logging.
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("asr failed: {0}")]
    AsrFailed(String),
    #[error("translation failed: {0}")]
    TranslationFailed(String),
}
