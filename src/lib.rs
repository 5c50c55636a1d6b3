//! G.729 compression of raw PCM captures.
//!
//! Reads headerless 16-bit little-endian mono 8kHz PCM (or a standard WAV
//! file already in that format), encodes it in 10ms frames, and writes a
//! WAV container whose payload is the concatenated variable-length G.729
//! frames behind format tag 0x0133.
//!
//! By default frames come from a built-in deterministic stand-in channel;
//! enable the `bcg729` feature to link the system libbcg729 encoder instead.
//!
//! ```no_run
//! let options = pcm2g729::ConvertOptions::default();
//! let summary = pcm2g729::convert_file("capture.pcm", "capture.wav", &options)?;
//! println!("{} frames", summary.frame_count);
//! # Ok::<(), pcm2g729::Error>(())
//! ```

#[cfg(feature = "bcg729")]
mod bcg729;
mod convert;
mod encoder;
mod error;
pub mod wav;

pub use convert::{
    convert_file, encode_reader, encode_samples, ConvertOptions, ConvertSummary, EncodedStream,
};
pub use encoder::{
    open_channel, EncodedFrame, EncoderChannel, SimChannel, FRAME_SIZE, MAX_FRAME_BYTES,
};
pub use error::Error;
