use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open input file {path}: {source}")]
    OpenInput { path: PathBuf, source: io::Error },

    #[error("failed to create output file {path}: {source}")]
    CreateOutput { path: PathBuf, source: io::Error },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("encoder initialization failed")]
    EncoderInit,

    #[error("failed to read WAV input: {0}")]
    WavInput(#[from] hound::Error),

    #[error(
        "unsupported WAV input: expected 8000 Hz mono 16-bit PCM, \
         got {sample_rate} Hz, {channels} channel(s), {bits_per_sample}-bit"
    )]
    UnsupportedWav {
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
    },

    #[error("not a RIFF/WAVE stream")]
    NotRiff,

    #[error("malformed {chunk} chunk")]
    BadChunk { chunk: &'static str },

    #[error("unsupported format tag {0:#06x}")]
    UnsupportedFormatTag(u16),
}
