/// Accumulates decoded 16kHz mono PCM for one in-progress utterance.
///
/// Grounded on the teacher's fixed-size ring buffer, reshaped from a
/// pre-speech padding ring into an append-only buffer with a hard cap: once
/// the buffered audio exceeds the cap, the oldest samples are discarded from
/// the front rather than growing without bound, and a one-shot `truncated`
/// flag records that it happened.
pub struct UtteranceAssembler {
    samples: Vec<f32>,
    max_samples: usize,
    truncated: bool,
}

impl UtteranceAssembler {
    pub fn new(sample_rate_hz: u32, hard_cap_seconds: f64) -> Self {
        let max_samples = (sample_rate_hz as f64 * hard_cap_seconds).round() as usize;
        Self {
            samples: Vec::new(),
            max_samples,
            truncated: false,
        }
    }

    /// Appends newly decoded samples, discarding the oldest once over cap.
    pub fn push(&mut self, chunk: &[f32]) {
        self.samples.extend_from_slice(chunk);
        if self.samples.len() > self.max_samples {
            let overflow = self.samples.len() - self.max_samples;
            self.samples.drain(..overflow);
            self.truncated = true;
        }
    }

    /// Number of samples currently buffered.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether samples have been dropped from the front since the last `take`.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Drains the buffered audio and clears the truncated flag.
    pub fn take(&mut self) -> Vec<f32> {
        self.truncated = false;
        std::mem::take(&mut self.samples)
    }
}
