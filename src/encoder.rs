//! The encoder-channel seam.
//!
//! A channel is created once per conversion, fed 80-sample frames in order,
//! and torn down when dropped. With the `bcg729` feature the channel is the
//! reference encoder from libbcg729; otherwise [`SimChannel`] stands in so
//! the converter and its tests run with no system dependency.

use bitstream_io::{BigEndian, BitWriter};

use crate::error::Error;

/// Samples per frame: 10ms of mono audio at 8kHz.
pub const FRAME_SIZE: usize = 80;

/// Largest possible encoded frame: 80 bits.
pub const MAX_FRAME_BYTES: usize = 10;

/// One encoded frame and its length.
///
/// Frames are variable-length; a length of 0 is a valid frame (silence
/// suppressed by VAD) and contributes no payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedFrame {
    data: [u8; MAX_FRAME_BYTES],
    len: u8,
}

impl EncodedFrame {
    pub fn new(data: [u8; MAX_FRAME_BYTES], len: u8) -> Self {
        assert!(len as usize <= MAX_FRAME_BYTES);
        EncodedFrame { data, len }
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        assert!(bytes.len() <= MAX_FRAME_BYTES);
        let mut data = [0u8; MAX_FRAME_BYTES];
        data[..bytes.len()].copy_from_slice(bytes);
        EncodedFrame {
            data,
            len: bytes.len() as u8,
        }
    }

    /// A zero-length (untransmitted) frame.
    pub fn empty() -> Self {
        EncodedFrame {
            data: [0; MAX_FRAME_BYTES],
            len: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One encoder channel: accepts PCM frames in order, yields encoded frames.
pub trait EncoderChannel {
    fn encode(&mut self, pcm: &[i16; FRAME_SIZE]) -> Result<EncodedFrame, Error>;
}

/// Create an encoder channel.
///
/// With `vad` enabled the encoder may emit zero-length frames for silence.
pub fn open_channel(vad: bool) -> Result<Box<dyn EncoderChannel>, Error> {
    #[cfg(feature = "bcg729")]
    {
        Ok(Box::new(crate::bcg729::Bcg729Channel::open(vad)?))
    }
    #[cfg(not(feature = "bcg729"))]
    {
        Ok(Box::new(SimChannel::new(vad)))
    }
}

/// Deterministic stand-in encoder channel.
///
/// Emits frames with the G.729A bit layout (ITU-T Table 8 field widths,
/// packed MSB-first) whose parameter values are derived from per-subframe
/// signal measurements. The output is structurally valid but is not
/// decodable speech; build with the `bcg729` feature for real encoding.
pub struct SimChannel {
    vad: bool,
}

impl SimChannel {
    pub fn new(vad: bool) -> Self {
        SimChannel { vad }
    }
}

const SUBFRAME_SIZE: usize = FRAME_SIZE / 2;

// Pitch lag range of the codec.
const PIT_MIN: u32 = 20;
const PIT_MAX: u32 = 143;

struct Subframe {
    energy: u64,
    zero_crossings: u32,
    peak: u16,
}

fn analyze(sub: &[i16]) -> Subframe {
    let energy = sub.iter().map(|&s| (s as i64 * s as i64) as u64).sum();
    let zero_crossings = sub.windows(2).filter(|w| (w[0] ^ w[1]) < 0).count() as u32;
    let peak = sub.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
    Subframe {
        energy,
        zero_crossings,
        peak,
    }
}

fn log2(v: u64) -> u32 {
    if v == 0 {
        0
    } else {
        v.ilog2()
    }
}

impl EncoderChannel for SimChannel {
    fn encode(&mut self, pcm: &[i16; FRAME_SIZE]) -> Result<EncodedFrame, Error> {
        if self.vad && pcm.iter().all(|&s| s == 0) {
            return Ok(EncodedFrame::empty());
        }

        let a1 = analyze(&pcm[..SUBFRAME_SIZE]);
        let a2 = analyze(&pcm[SUBFRAME_SIZE..]);

        let p1 = PIT_MIN + (a1.zero_crossings * 3) % (PIT_MAX - PIT_MIN + 1);
        // Parity over the six most significant pitch bits.
        let p0 = (p1 >> 2).count_ones() & 1;

        let mut buf = Vec::with_capacity(MAX_FRAME_BYTES);
        {
            let mut bits = BitWriter::endian(&mut buf, BigEndian);
            bits.write(1, (a1.zero_crossings ^ a2.zero_crossings) & 1)?;
            bits.write(7, (a1.peak as u32 >> 8) & 0x7F)?;
            bits.write(5, a1.zero_crossings & 0x1F)?;
            bits.write(5, a2.zero_crossings & 0x1F)?;
            bits.write(8, p1)?;
            bits.write(1, p0)?;
            bits.write(13, (a1.energy & 0x1FFF) as u32)?;
            bits.write(4, ((a1.energy >> 13) & 0xF) as u32)?;
            bits.write(3, (log2(a1.energy) / 5).min(7))?;
            bits.write(4, log2(a1.energy) & 0xF)?;
            bits.write(5, (a2.zero_crossings * 3) & 0x1F)?;
            bits.write(13, (a2.energy & 0x1FFF) as u32)?;
            bits.write(4, ((a2.energy >> 13) & 0xF) as u32)?;
            bits.write(3, (log2(a2.energy) / 5).min(7))?;
            bits.write(4, log2(a2.energy) & 0xF)?;
        }
        debug_assert_eq!(buf.len(), MAX_FRAME_BYTES);

        Ok(EncodedFrame::from_slice(&buf))
    }
}
