//! The conversion driver: read PCM frames, encode them, emit the container.
//!
//! The header declares the exact payload size and sample count, so every
//! encoded frame is buffered in memory before the first output byte is
//! written. Raw inputs are counted in a first pass and encoded in a second;
//! WAV inputs arrive already decoded and are framed directly.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::encoder::{self, EncodedFrame, EncoderChannel, FRAME_SIZE};
use crate::error::Error;
use crate::wav;

const FRAME_BYTES: usize = FRAME_SIZE * 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Enable voice activity detection; silent frames may encode to 0 bytes.
    pub vad: bool,
}

/// Totals of a finished conversion, as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertSummary {
    pub frame_count: u32,
    pub sample_count: u32,
    pub data_size: u32,
}

/// The ordered encoded frames of one input, plus their derived totals.
pub struct EncodedStream {
    frames: Vec<EncodedFrame>,
}

impl EncodedStream {
    fn with_capacity(frames: usize) -> Self {
        EncodedStream {
            frames: Vec::with_capacity(frames),
        }
    }

    fn push(&mut self, frame: EncodedFrame) {
        self.frames.push(frame);
    }

    pub fn frame_count(&self) -> u32 {
        self.frames.len() as u32
    }

    pub fn sample_count(&self) -> u32 {
        self.frame_count() * FRAME_SIZE as u32
    }

    pub fn data_size(&self) -> u32 {
        self.frames.iter().map(|f| f.len() as u32).sum()
    }

    pub fn summary(&self) -> ConvertSummary {
        ConvertSummary {
            frame_count: self.frame_count(),
            sample_count: self.sample_count(),
            data_size: self.data_size(),
        }
    }

    /// Write the container header followed by every frame's payload bytes.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        wav::write_header(w, self.data_size(), self.sample_count())?;
        for frame in &self.frames {
            w.write_all(frame.as_bytes())?;
        }
        Ok(())
    }
}

/// Convert one input file into a G.729 WAV container.
///
/// The input is raw headerless 16-bit little-endian mono 8kHz PCM, or a
/// standard WAV file in that same format (detected by the RIFF magic).
pub fn convert_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Result<ConvertSummary, Error> {
    let input = input.as_ref();
    let output = output.as_ref();

    let file = File::open(input).map_err(|source| Error::OpenInput {
        path: input.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    let out = File::create(output).map_err(|source| Error::CreateOutput {
        path: output.to_path_buf(),
        source,
    })?;

    let mut channel = encoder::open_channel(options.vad)?;

    let stream = if sniff_riff(&mut reader)? {
        debug!(path = %input.display(), "input detected as RIFF/WAVE");
        let samples = wav::read_pcm_wav(reader)?;
        encode_samples(&samples, channel.as_mut())?
    } else {
        encode_reader(&mut reader, channel.as_mut())?
    };

    let mut writer = BufWriter::new(out);
    stream.write_to(&mut writer)?;
    writer.flush()?;

    let summary = stream.summary();
    debug!(
        frames = summary.frame_count,
        bytes = summary.data_size,
        path = %output.display(),
        "conversion finished"
    );
    Ok(summary)
}

/// Encode raw PCM from a seekable stream.
///
/// Pass one counts the frames so the buffer and the header totals are exact;
/// pass two re-reads from the start and encodes. A final short frame is
/// zero-padded to full size; a trailing byte that cannot form a complete
/// sample is discarded.
pub fn encode_reader<R: Read + Seek>(
    reader: &mut R,
    channel: &mut dyn EncoderChannel,
) -> Result<EncodedStream, Error> {
    let mut buf = [0u8; FRAME_BYTES];

    let mut frame_count: u32 = 0;
    loop {
        let filled = read_frame(reader, &mut buf)?;
        if filled / 2 == 0 {
            break;
        }
        frame_count += 1;
    }
    reader.seek(SeekFrom::Start(0))?;

    let mut stream = EncodedStream::with_capacity(frame_count as usize);
    let mut pcm = [0i16; FRAME_SIZE];
    for _ in 0..frame_count {
        let filled = read_frame(reader, &mut buf)?;
        let samples = filled / 2;
        buf[samples * 2..].fill(0);
        LittleEndian::read_i16_into(&buf, &mut pcm);
        stream.push(channel.encode(&pcm)?);
    }

    debug!(
        frames = frame_count,
        bytes = stream.data_size(),
        "encoded raw PCM input"
    );
    Ok(stream)
}

/// Encode already-decoded samples, framing and zero-padding as needed.
pub fn encode_samples(
    samples: &[i16],
    channel: &mut dyn EncoderChannel,
) -> Result<EncodedStream, Error> {
    let mut stream = EncodedStream::with_capacity(samples.len().div_ceil(FRAME_SIZE));
    let mut pcm = [0i16; FRAME_SIZE];
    for chunk in samples.chunks(FRAME_SIZE) {
        pcm[..chunk.len()].copy_from_slice(chunk);
        pcm[chunk.len()..].fill(0);
        stream.push(channel.encode(&pcm)?);
    }

    debug!(
        frames = stream.frame_count(),
        bytes = stream.data_size(),
        "encoded WAV input"
    );
    Ok(stream)
}

/// Fill `buf` from the reader, stopping early only at end of input.
fn read_frame<R: Read>(reader: &mut R, buf: &mut [u8; FRAME_BYTES]) -> Result<usize, Error> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

fn sniff_riff<R: Read + Seek>(reader: &mut R) -> Result<bool, Error> {
    let mut magic = [0u8; 4];
    let looks_like_wav = match reader.read_exact(&mut magic) {
        Ok(()) => &magic == b"RIFF",
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => false,
        Err(e) => return Err(e.into()),
    };
    reader.seek(SeekFrom::Start(0))?;
    Ok(looks_like_wav)
}
