#[cfg(feature = "local-whisper")]
pub mod local_whisper;

pub mod deterministic;

use async_trait::async_trait;

/// Request to transcribe an audio segment.
pub struct AsrRequest {
    /// PCM audio at 16kHz mono, f32 normalized [-1.0, 1.0].
    pub audio_pcm_16k_mono: Vec<f32>,
    /// Declared language of the speaker (short tag), forwarded as a hint
    /// and used as the fallback when the backend can't detect one.
    pub language_hint: Option<String>,
}

/// Result of an ASR transcription.
#[derive(Debug, Clone)]
pub struct AsrResult {
    pub text: String,
    /// Detected source language (short tag), if the backend could tell.
    pub detected_language: Option<String>,
    pub confidence: Option<f64>,
}

/// Trait for pluggable ASR backends.
///
/// A backend is not required to be safe to call concurrently with itself —
/// the `InferencePipeline` is the only caller and it serializes access via
/// a single permit.
#[async_trait]
pub trait AsrBackend: Send + Sync + 'static {
    /// Transcribes a complete, already-finalized utterance.
    async fn transcribe(&self, request: AsrRequest) -> anyhow::Result<AsrResult>;

    /// Human-readable backend name, used only for logging/diagnostics.
    fn name(&self) -> &str;
}
