//! The G.729 WAV container: a RIFF/WAVE preamble with `fmt `, `fact` and
//! `data` chunks, followed by the concatenated variable-length frames.
//!
//! The header layout is fixed at [`HEADER_LEN`] bytes and is consumed by
//! tooling that expects these exact bytes, including the non-standard format
//! tag 0x0133 and a byte rate field of 8000. Neither is negotiable.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::Error;

/// Total size of the container preamble in bytes.
pub const HEADER_LEN: usize = 56;

/// Format tag identifying the G.729 payload to downstream players.
pub const FORMAT_TAG_G729: u16 = 0x0133;

const SAMPLE_RATE: u32 = 8000;
const BYTE_RATE: u32 = 8000;
const CHANNELS: u16 = 1;
const BLOCK_ALIGN: u16 = 10;
const FMT_CHUNK_SIZE: u32 = 16;
const FACT_CHUNK_SIZE: u32 = 4;

// "WAVE" + fmt chunk + fact chunk + data chunk header. The RIFF size field
// counts this fixed overhead plus the payload, never the actual chunk sizes.
const RIFF_OVERHEAD: u32 = 4 + 24 + 12 + 8;

/// Write the fixed-size container header.
///
/// `data_size` is the total payload byte count that will follow the header;
/// `sample_count` is the total number of PCM samples the payload represents
/// (always a whole number of 80-sample frames).
pub fn write_header<W: Write>(w: &mut W, data_size: u32, sample_count: u32) -> io::Result<()> {
    w.write_all(b"RIFF")?;
    w.write_u32::<LittleEndian>(RIFF_OVERHEAD + data_size)?;
    w.write_all(b"WAVE")?;

    w.write_all(b"fmt ")?;
    w.write_u32::<LittleEndian>(FMT_CHUNK_SIZE)?;
    w.write_u16::<LittleEndian>(FORMAT_TAG_G729)?;
    w.write_u16::<LittleEndian>(CHANNELS)?;
    w.write_u32::<LittleEndian>(SAMPLE_RATE)?;
    w.write_u32::<LittleEndian>(BYTE_RATE)?;
    w.write_u16::<LittleEndian>(BLOCK_ALIGN)?;
    // Bits per sample is meaningless for a compressed payload.
    w.write_u16::<LittleEndian>(0)?;

    w.write_all(b"fact")?;
    w.write_u32::<LittleEndian>(FACT_CHUNK_SIZE)?;
    w.write_u32::<LittleEndian>(sample_count)?;

    w.write_all(b"data")?;
    w.write_u32::<LittleEndian>(data_size)?;

    Ok(())
}

/// The two variable fields of a container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub data_size: u32,
    pub sample_count: u32,
}

impl Header {
    /// Parse a container header, validating every fixed field.
    ///
    /// Only headers emitted by [`write_header`] are accepted; a standard PCM
    /// WAV file fails with [`Error::UnsupportedFormatTag`].
    pub fn read<R: Read>(r: &mut R) -> Result<Self, Error> {
        if &read_tag(r)? != b"RIFF" {
            return Err(Error::NotRiff);
        }
        let riff_size = r.read_u32::<LittleEndian>()?;
        if &read_tag(r)? != b"WAVE" {
            return Err(Error::NotRiff);
        }

        if &read_tag(r)? != b"fmt " || r.read_u32::<LittleEndian>()? != FMT_CHUNK_SIZE {
            return Err(Error::BadChunk { chunk: "fmt " });
        }
        let tag = r.read_u16::<LittleEndian>()?;
        if tag != FORMAT_TAG_G729 {
            return Err(Error::UnsupportedFormatTag(tag));
        }
        if r.read_u16::<LittleEndian>()? != CHANNELS
            || r.read_u32::<LittleEndian>()? != SAMPLE_RATE
            || r.read_u32::<LittleEndian>()? != BYTE_RATE
            || r.read_u16::<LittleEndian>()? != BLOCK_ALIGN
            || r.read_u16::<LittleEndian>()? != 0
        {
            return Err(Error::BadChunk { chunk: "fmt " });
        }

        if &read_tag(r)? != b"fact" || r.read_u32::<LittleEndian>()? != FACT_CHUNK_SIZE {
            return Err(Error::BadChunk { chunk: "fact" });
        }
        let sample_count = r.read_u32::<LittleEndian>()?;

        if &read_tag(r)? != b"data" {
            return Err(Error::BadChunk { chunk: "data" });
        }
        let data_size = r.read_u32::<LittleEndian>()?;

        if riff_size != RIFF_OVERHEAD + data_size {
            return Err(Error::BadChunk { chunk: "RIFF" });
        }

        Ok(Header {
            data_size,
            sample_count,
        })
    }
}

fn read_tag<R: Read>(r: &mut R) -> Result<[u8; 4], Error> {
    let mut tag = [0u8; 4];
    r.read_exact(&mut tag)?;
    Ok(tag)
}

/// Read a standard RIFF/WAVE input file and return its samples.
///
/// The file must already be 8000 Hz mono 16-bit integer PCM; no resampling
/// or channel mixing is performed.
pub fn read_pcm_wav<R: Read>(reader: R) -> Result<Vec<i16>, Error> {
    let mut wav = hound::WavReader::new(reader)?;
    let spec = wav.spec();
    if spec.sample_rate != SAMPLE_RATE
        || spec.channels != CHANNELS
        || spec.bits_per_sample != 16
        || spec.sample_format != hound::SampleFormat::Int
    {
        return Err(Error::UnsupportedWav {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
        });
    }
    let samples = wav.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(data_size: u32, sample_count: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        write_header(&mut buf, data_size, sample_count).unwrap();
        buf
    }

    #[test]
    fn header_has_fixed_length() {
        assert_eq!(header_bytes(0, 0).len(), HEADER_LEN);
        assert_eq!(header_bytes(1234, 5678).len(), HEADER_LEN);
    }

    #[test]
    fn header_fields_are_byte_exact() {
        let buf = header_bytes(20, 160);

        assert_eq!(&buf[0..4], b"RIFF");
        // 48 bytes of fixed overhead plus the payload.
        assert_eq!(buf[4..8], (48u32 + 20).to_le_bytes());
        assert_eq!(&buf[8..12], b"WAVE");

        assert_eq!(&buf[12..16], b"fmt ");
        assert_eq!(buf[16..20], 16u32.to_le_bytes());
        assert_eq!(buf[20..22], 0x0133u16.to_le_bytes());
        assert_eq!(buf[22..24], 1u16.to_le_bytes());
        assert_eq!(buf[24..28], 8000u32.to_le_bytes());
        assert_eq!(buf[28..32], 8000u32.to_le_bytes());
        assert_eq!(buf[32..34], 10u16.to_le_bytes());
        assert_eq!(buf[34..36], 0u16.to_le_bytes());

        assert_eq!(&buf[36..40], b"fact");
        assert_eq!(buf[40..44], 4u32.to_le_bytes());
        assert_eq!(buf[44..48], 160u32.to_le_bytes());

        assert_eq!(&buf[48..52], b"data");
        assert_eq!(buf[52..56], 20u32.to_le_bytes());
    }

    #[test]
    fn empty_header_declares_zero_sizes() {
        let buf = header_bytes(0, 0);
        assert_eq!(buf[4..8], 48u32.to_le_bytes());
        assert_eq!(buf[44..48], 0u32.to_le_bytes());
        assert_eq!(buf[52..56], 0u32.to_le_bytes());
    }

    #[test]
    fn header_round_trips() {
        let buf = header_bytes(987, 43_210);
        let header = Header::read(&mut buf.as_slice()).unwrap();
        assert_eq!(
            header,
            Header {
                data_size: 987,
                sample_count: 43_210
            }
        );
    }

    #[test]
    fn read_rejects_non_riff() {
        let err = Header::read(&mut &b"JUNKJUNKJUNK"[..]).unwrap_err();
        assert!(matches!(err, Error::NotRiff));
    }

    #[test]
    fn read_rejects_foreign_format_tag() {
        let mut buf = header_bytes(0, 0);
        // Overwrite the format tag with plain PCM.
        buf[20..22].copy_from_slice(&1u16.to_le_bytes());
        let err = Header::read(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormatTag(1)));
    }

    #[test]
    fn read_rejects_inconsistent_riff_size() {
        let mut buf = header_bytes(100, 160);
        buf[4..8].copy_from_slice(&7u32.to_le_bytes());
        let err = Header::read(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, Error::BadChunk { chunk: "RIFF" }));
    }

    #[test]
    fn read_rejects_truncated_header() {
        let buf = header_bytes(0, 0);
        let err = Header::read(&mut &buf[..30]).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn wav_input_must_match_codec_format() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();
        cursor.set_position(0);

        let err = read_pcm_wav(cursor).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedWav {
                sample_rate: 44_100,
                channels: 2,
                ..
            }
        ));
    }
}
