use std::convert::TryFrom;

use audiopus::coder::Decoder;
use audiopus::packet::Packet;
use audiopus::{Channels, MutSignals, SampleRate};
use base64::Engine;
use thiserror::Error;

use super::resampler::Resampler;

/// Maximum Opus frame: 120ms at 48kHz mono = 5760 samples.
const MAX_FRAME_SIZE: usize = 5760;

/// Input frames per resampler chunk (20ms at 48kHz).
const RESAMPLER_CHUNK_SIZE: usize = 960;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("invalid opus packet: {0}")]
    InvalidPacket(String),
    #[error("opus decode failed: {0}")]
    DecodeFailed(String),
    #[error("resample failed: {0}")]
    ResampleFailed(String),
}

/// Per-participant decode session: one Opus decoder plus the resampler that
/// turns its 48kHz mono output into the 16kHz mono PCM the ASR expects.
///
/// Held for the lifetime of a participant's audio stream and reset whenever
/// that stream restarts (an explicit `utterance_end`, or a reconnect).
pub struct OpusSessionState {
    decoder: Decoder,
    decode_buf: Vec<f32>,
    resampler: Resampler,
}

impl OpusSessionState {
    pub fn new() -> anyhow::Result<Self> {
        let decoder = Decoder::new(SampleRate::Hz48000, Channels::Mono)
            .map_err(|e| anyhow::anyhow!("failed to create Opus decoder: {e:?}"))?;
        let resampler = Resampler::new(RESAMPLER_CHUNK_SIZE)?;
        Ok(Self {
            decoder,
            decode_buf: vec![0.0f32; MAX_FRAME_SIZE],
            resampler,
        })
    }

    /// Decodes one base64-encoded Opus packet into 16kHz mono PCM.
    ///
    /// A packet that fails to decode is reported as `DecodeError` and must
    /// be dropped by the caller without tearing down the session — the next
    /// packet decodes against the same decoder state.
    pub fn decode(&mut self, base64_payload: &str) -> Result<Vec<f32>, DecodeError> {
        let opus_data = base64::engine::general_purpose::STANDARD.decode(base64_payload)?;

        let packet = Packet::try_from(&opus_data[..])
            .map_err(|e| DecodeError::InvalidPacket(format!("{e:?}")))?;
        let output = MutSignals::try_from(&mut self.decode_buf[..])
            .map_err(|e| DecodeError::DecodeFailed(format!("{e:?}")))?;

        let samples = self
            .decoder
            .decode_float(Some(packet), output, false)
            .map_err(|e| DecodeError::DecodeFailed(format!("{e:?}")))?;

        self.resampler
            .process(&self.decode_buf[..samples])
            .map_err(|e| DecodeError::ResampleFailed(e.to_string()))
    }

    /// Resets decoder and resampler state, dropping any buffered samples.
    /// Called on `utterance_end` and on reconnect.
    pub fn reset(&mut self) -> anyhow::Result<()> {
        self.decoder = Decoder::new(SampleRate::Hz48000, Channels::Mono)
            .map_err(|e| anyhow::anyhow!("failed to recreate Opus decoder: {e:?}"))?;
        self.resampler = Resampler::new(RESAMPLER_CHUNK_SIZE)?;
        Ok(())
    }
}
