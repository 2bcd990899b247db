//! Inbound configuration protocol.
//!
//! Two shapes arrive on the serial line while the device is idle:
//!
//! - a single unframed byte selecting a get/set operation by numeric range,
//! - a framed structured command `[address, 16, command, id, data..]`.
//!
//! A `FRAME_START` byte followed by the device address switches the reader
//! into framed mode. A `FRAME_START` followed by anything else is a plain
//! single byte: it falls in the error-seconds range with an out-of-range
//! value and gets a setup error.

use std::array;
use std::iter::Flatten;

use crate::config::Thresholds;
use crate::frame::{Deframer, FRAME_START, Frame};
use crate::message::{ADDRESS_TO_DEVICE, ConfigParam, OutgoingMessage, PASSBY_COMMAND};

pub const CMD_RESET_COUNTERS: u8 = 0;
pub const CMD_GET_TICK_FREQ: u8 = 1;

/// Decoded single-byte command. Set variants carry the offset within their
/// range, still unvalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Echo(u8),
    SetErrorSeconds(u8),
    SetThresholdOff(u8),
    SetThresholdOn(u8),
    /// Window becomes `1 << exponent`.
    SetWindow(u8),
    Get(ConfigParam),
    Unknown(u8),
}

impl Command {
    /// Ranges are checked top-down; the first match wins.
    pub fn parse(byte: u8) -> Self {
        match byte {
            0xF0..=0xFF => Self::Echo(byte),
            61..=0xEF => Self::SetErrorSeconds(byte - 60),
            40..=60 => Self::SetThresholdOff(byte - 40),
            20..=39 => Self::SetThresholdOn(byte - 20),
            11..=19 => Self::SetWindow(byte - 10),
            1 => Self::Get(ConfigParam::WindowLength),
            2 => Self::Get(ConfigParam::ThresholdOn),
            3 => Self::Get(ConfigParam::ThresholdOff),
            4 => Self::Get(ConfigParam::ErrorSeconds),
            _ => Self::Unknown(byte),
        }
    }
}

/// Interpret `byte` against `thresholds`, mutating them on a valid set, and
/// return the reply. Rejected sets leave `thresholds` unchanged.
pub fn apply_byte(byte: u8, thresholds: &mut Thresholds) -> OutgoingMessage {
    let ok = OutgoingMessage::SetupOk { command: byte };
    let err = OutgoingMessage::SetupError { command: byte };
    match Command::parse(byte) {
        Command::Echo(b) => OutgoingMessage::Echo { byte: b },
        Command::SetErrorSeconds(s) => {
            if s < 5 {
                thresholds.error_seconds = s;
                ok
            } else {
                err
            }
        }
        Command::SetThresholdOff(v) => {
            if v < thresholds.half_window() {
                thresholds.threshold_off = v;
                ok
            } else {
                err
            }
        }
        Command::SetThresholdOn(v) => {
            if v < thresholds.half_window() {
                thresholds.threshold_on = v;
                ok
            } else {
                err
            }
        }
        Command::SetWindow(exp) => {
            if exp <= 5 {
                thresholds.window_length = 1 << exp;
                // Keep stored thresholds below the new half window
                let max = thresholds.half_window().saturating_sub(1);
                thresholds.threshold_on = thresholds.threshold_on.min(max);
                thresholds.threshold_off = thresholds.threshold_off.min(max);
                ok
            } else {
                err
            }
        }
        Command::Get(param) => OutgoingMessage::Report {
            param,
            value: match param {
                ConfigParam::WindowLength => thresholds.window_length,
                ConfigParam::ThresholdOn => thresholds.threshold_on,
                ConfigParam::ThresholdOff => thresholds.threshold_off,
                ConfigParam::ErrorSeconds => thresholds.error_seconds,
            },
        },
        Command::Unknown(_) => err,
    }
}

/// Structured command addressed to this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramedCommand {
    pub command: u8,
    pub id: u8,
}

impl FramedCommand {
    /// Parse a de-framed payload. Payloads for another address or with
    /// another header are not commands for us.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        match payload {
            [ADDRESS_TO_DEVICE, PASSBY_COMMAND, command, id, ..] => Some(Self {
                command: *command,
                id: *id,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Inbound {
    Byte(u8),
    Framed(Frame),
}

/// Splits the inbound byte stream into single-byte and framed commands.
///
/// A `FRAME_START` only opens a frame once the next byte is our address.
/// Otherwise the start byte is handed on as an ordinary (invalid) command
/// and the following byte is read on its own.
#[derive(Debug, Clone, Default)]
pub struct CommandReader {
    deframer: Deframer,
    start_seen: bool,
}

impl CommandReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte. Yields up to two inbound items, in arrival order.
    pub fn push(&mut self, byte: u8) -> Flatten<array::IntoIter<Option<Inbound>, 2>> {
        let mut out = [None, None];
        if self.deframer.in_frame() {
            out[0] = self.deframer.push(byte).map(Inbound::Framed);
        } else if self.start_seen {
            self.start_seen = false;
            if byte == ADDRESS_TO_DEVICE {
                self.deframer.push(FRAME_START);
                self.deframer.push(byte);
            } else {
                out = [Some(Inbound::Byte(FRAME_START)), self.push_idle(byte)];
            }
        } else {
            out[0] = self.push_idle(byte);
        }
        out.into_iter().flatten()
    }

    fn push_idle(&mut self, byte: u8) -> Option<Inbound> {
        if byte == FRAME_START {
            self.start_seen = true;
            None
        } else {
            Some(Inbound::Byte(byte))
        }
    }

    /// Whether a frame start or partial frame is being held back.
    pub fn is_pending(&self) -> bool {
        self.start_seen || self.deframer.in_frame()
    }

    /// Forget any partially received frame.
    pub fn reset(&mut self) {
        self.deframer = Deframer::new();
        self.start_seen = false;
    }
}
