pub mod assembler;
pub mod opus;
pub mod resampler;

pub use assembler::UtteranceAssembler;
pub use opus::{DecodeError, OpusSessionState};
pub use resampler::Resampler;
