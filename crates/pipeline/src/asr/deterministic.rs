use async_trait::async_trait;

use super::{AsrBackend, AsrRequest, AsrResult};

/// Deterministic ASR stand-in used for tests and for running the pipeline
/// without a Whisper model on disk.
///
/// Produces a fixed transcript derived only from the input length, so tests
/// can assert on the shape of a round trip without shipping model weights.
pub struct DeterministicAsrBackend;

#[async_trait]
impl AsrBackend for DeterministicAsrBackend {
    async fn transcribe(&self, request: AsrRequest) -> anyhow::Result<AsrResult> {
        let samples = request.audio_pcm_16k_mono.len();
        let text = format!("[utterance of {} samples]", samples);
        Ok(AsrResult {
            text,
            detected_language: request.language_hint,
            confidence: Some(1.0),
        })
    }

    fn name(&self) -> &str {
        "deterministic"
    }
}
