//! Byte-stuffed framing.
//!
//! A frame is `FRAME_START, payload, FRAME_STOP`, with `FRAME_ESC` inserted
//! before every payload byte that equals one of the three control bytes.

use std::ops::Deref;

use crate::error::CoreError;
use crate::message::MAX_MESSAGE;

pub const FRAME_START: u8 = 0x7C;
pub const FRAME_STOP: u8 = 0x7D;
pub const FRAME_ESC: u8 = 0x7E;

/// Worst case framed size of any outgoing message.
pub const MAX_FRAME: usize = 2 * MAX_MESSAGE + 2;
/// Largest payload the deframer accepts before dropping the frame.
pub const FRAME_CAPACITY: usize = 32;

#[inline]
fn is_control(b: u8) -> bool {
    matches!(b, FRAME_START | FRAME_STOP | FRAME_ESC)
}

/// Frame `payload` into `out`, returning the number of bytes written.
pub fn encode_frame(payload: &[u8], out: &mut [u8]) -> Result<usize, CoreError> {
    let needed = 2 + payload.len() + payload.iter().filter(|b| is_control(**b)).count();
    if out.len() < needed {
        return Err(CoreError::Frame(format!(
            "output buffer holds {} bytes, frame needs {needed}",
            out.len()
        )));
    }
    let mut n = 0;
    out[n] = FRAME_START;
    n += 1;
    for &b in payload {
        if is_control(b) {
            out[n] = FRAME_ESC;
            n += 1;
        }
        out[n] = b;
        n += 1;
    }
    out[n] = FRAME_STOP;
    Ok(n + 1)
}

/// Allocating convenience wrapper around [`encode_frame`] for host-side tools.
pub fn frame_to_vec(payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; 2 + 2 * payload.len()];
    // The buffer is sized for the worst case
    let n = encode_frame(payload, &mut out).unwrap_or(0);
    out.truncate(n);
    out
}

/// A complete de-framed payload.
#[derive(Clone, Copy)]
pub struct Frame {
    bytes: [u8; FRAME_CAPACITY],
    len: usize,
}

impl Frame {
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl Deref for Frame {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl core::fmt::Debug for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Frame").field(&self.as_slice()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeframeState {
    Outside,
    Inside,
    Escaped,
}

/// Streaming frame decoder with fixed capacity.
///
/// Bytes outside a frame are ignored, `FRAME_START` always begins a new frame
/// (discarding a partial one), `FRAME_ESC` takes the following byte literally
/// and `FRAME_STOP` completes the frame. Frames longer than
/// [`FRAME_CAPACITY`] are dropped.
#[derive(Debug, Clone)]
pub struct Deframer {
    buf: [u8; FRAME_CAPACITY],
    len: usize,
    state: DeframeState,
    dropped: u32,
}

impl Default for Deframer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deframer {
    pub const fn new() -> Self {
        Self {
            buf: [0; FRAME_CAPACITY],
            len: 0,
            state: DeframeState::Outside,
            dropped: 0,
        }
    }

    pub fn in_frame(&self) -> bool {
        self.state != DeframeState::Outside
    }

    /// Frames discarded for exceeding the capacity.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            DeframeState::Outside => {
                if byte == FRAME_START {
                    self.state = DeframeState::Inside;
                    self.len = 0;
                } else {
                    tracing::trace!(byte, "ignoring byte outside frame");
                }
                None
            }
            DeframeState::Inside => match byte {
                FRAME_START => {
                    if self.len > 0 {
                        tracing::debug!(discarded = self.len, "frame restarted");
                    }
                    self.len = 0;
                    None
                }
                FRAME_STOP => {
                    self.state = DeframeState::Outside;
                    Some(Frame {
                        bytes: self.buf,
                        len: self.len,
                    })
                }
                FRAME_ESC => {
                    self.state = DeframeState::Escaped;
                    None
                }
                b => {
                    self.append(b);
                    None
                }
            },
            DeframeState::Escaped => {
                self.state = DeframeState::Inside;
                self.append(byte);
                None
            }
        }
    }

    fn append(&mut self, byte: u8) {
        if self.len == FRAME_CAPACITY {
            self.dropped = self.dropped.saturating_add(1);
            tracing::warn!(capacity = FRAME_CAPACITY, "frame overflow, dropping");
            self.state = DeframeState::Outside;
            self.len = 0;
            return;
        }
        self.buf[self.len] = byte;
        self.len += 1;
    }
}

/// Split a captured byte stream into its frames.
pub fn decode_stream(bytes: &[u8]) -> Vec<Frame> {
    let mut d = Deframer::new();
    bytes.iter().filter_map(|&b| d.push(b)).collect()
}
