use serde::{Deserialize, Serialize};

/// Configuration for the inference pipeline (ASR + Translation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// ASR backend to use: "local_whisper" or "deterministic" (test/dev).
    pub asr_backend: String,
    /// Path to the Whisper model file (for the local_whisper backend).
    pub whisper_model_path: Option<String>,
    /// Translation backend to use: "remote_http" or "identity" (test/dev).
    pub translation_backend: String,
    /// Endpoint for the remote HTTP translation backend.
    pub translation_endpoint: Option<String>,
    /// Language hint forwarded to the ASR when no per-utterance hint is given.
    pub language: Option<String>,
    /// Concurrency of the pipeline stage — how many transcribe+translate
    /// calls may run at once across all rooms.
    pub pipeline_permits: usize,
    /// Hard cap on a single utterance buffer, in seconds of audio.
    pub utterance_hard_cap_seconds: f64,
    /// Deadline for a single `transcribe_and_translate` call, if any.
    pub utterance_deadline_ms: Option<u64>,
    /// Opaque device selector, passed through to the ASR backend untouched.
    pub device: String,
    /// Opaque compute-type selector, passed through to the ASR backend untouched.
    pub compute_type: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            asr_backend: "deterministic".to_string(),
            whisper_model_path: None,
            translation_backend: "identity".to_string(),
            translation_endpoint: None,
            language: None,
            pipeline_permits: 1,
            utterance_hard_cap_seconds: 30.0,
            utterance_deadline_ms: Some(15_000),
            device: "cpu".to_string(),
            compute_type: "default".to_string(),
        }
    }
}
