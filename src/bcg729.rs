//! Channel backend over the libbcg729 reference encoder.
//!
//! Links against the system library; enabled with the `bcg729` feature.

use std::os::raw::c_void;

use crate::encoder::{EncodedFrame, EncoderChannel, FRAME_SIZE, MAX_FRAME_BYTES};
use crate::error::Error;

#[allow(non_snake_case)]
#[link(name = "bcg729")]
extern "C" {
    fn initBcg729EncoderChannel(enableVAD: u8) -> *mut c_void;
    fn bcg729Encoder(
        encoderChannelContext: *mut c_void,
        inputFrame: *const i16,
        bitStream: *mut u8,
        bitStreamLength: *mut u8,
    );
    fn closeBcg729EncoderChannel(encoderChannelContext: *mut c_void);
}

pub struct Bcg729Channel {
    ctx: *mut c_void,
}

impl Bcg729Channel {
    pub fn open(vad: bool) -> Result<Self, Error> {
        let ctx = unsafe { initBcg729EncoderChannel(vad as u8) };
        if ctx.is_null() {
            return Err(Error::EncoderInit);
        }
        Ok(Bcg729Channel { ctx })
    }
}

impl EncoderChannel for Bcg729Channel {
    fn encode(&mut self, pcm: &[i16; FRAME_SIZE]) -> Result<EncodedFrame, Error> {
        let mut out = [0u8; MAX_FRAME_BYTES];
        let mut len = 0u8;
        unsafe {
            bcg729Encoder(self.ctx, pcm.as_ptr(), out.as_mut_ptr(), &mut len);
        }
        Ok(EncodedFrame::new(out, len))
    }
}

impl Drop for Bcg729Channel {
    fn drop(&mut self) {
        unsafe {
            closeBcg729EncoderChannel(self.ctx);
        }
    }
}
