use audiopus::coder::Encoder;
use audiopus::{Application, Channels, SampleRate};
use base64::Engine;

/// 20ms mono frames at 48kHz, matching the server's resampler chunk size
/// (`RESAMPLER_CHUNK_SIZE` in `babblefish_pipeline::pipeline::opus`).
const FRAME_SAMPLES: usize = 960;

/// Encodes a short synthetic utterance as a sequence of base64 Opus
/// packets, the same shape the `audio` wire message carries (§6).
///
/// Used by black-box tests that need real Opus bytes to exercise the full
/// decode -> resample -> assemble -> pipeline path, rather than asserting
/// only on the JSON envelope.
pub fn encode_tone_packets(num_frames: usize) -> Vec<String> {
    let mut encoder = Encoder::new(SampleRate::Hz48000, Channels::Mono, Application::Voip)
        .expect("opus encoder for test fixtures");

    (0..num_frames)
        .map(|frame_idx| {
            let pcm: Vec<f32> = (0..FRAME_SAMPLES)
                .map(|i| {
                    let t = (frame_idx * FRAME_SAMPLES + i) as f32 / 48_000.0;
                    0.2 * (2.0 * std::f32::consts::PI * 220.0 * t).sin()
                })
                .collect();

            let mut opus_buf = vec![0u8; 4000];
            let len = encoder
                .encode_float(&pcm, &mut opus_buf)
                .expect("encode test tone frame");
            opus_buf.truncate(len);

            base64::engine::general_purpose::STANDARD.encode(&opus_buf)
        })
        .collect()
}
