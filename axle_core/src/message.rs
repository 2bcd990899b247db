//! Outgoing message model and its fixed-layout payload encoding.
//!
//! Wheel reports and configuration replies start with a one-byte header.
//! Pass-by messages start with the address byte [`ADDRESS_TO_MASTER`]
//! followed by their own header. Multi-byte fields are little-endian.

use crate::error::CoreError;

pub const HEADER_AXLE: u8 = 1;
pub const HEADER_AXLE_ERROR: u8 = 2;
pub const HEADER_SETUP_OK: u8 = 3;
pub const HEADER_SETUP_ERROR: u8 = 4;
pub const HEADER_THRESHOLD_ON: u8 = 5;
pub const HEADER_THRESHOLD_OFF: u8 = 6;
pub const HEADER_ERROR_SECONDS: u8 = 7;
pub const HEADER_WINDOW_LENGTH: u8 = 8;
pub const HEADER_ECHO: u8 = 0xF1;

pub const DEVICE_ADDRESS: u8 = 1;
pub const MASTER_ADDRESS: u8 = 0;
/// Source in the high nibble, destination in the low nibble.
pub const ADDRESS_TO_MASTER: u8 = (DEVICE_ADDRESS << 4) | MASTER_ADDRESS;
pub const ADDRESS_TO_DEVICE: u8 = (MASTER_ADDRESS << 4) | DEVICE_ADDRESS;

pub const PASSBY_START: u8 = 1;
pub const PASSBY_STOP: u8 = 2;
pub const PASSBY_AXLE: u8 = 3;
pub const PASSBY_COMMAND: u8 = 16;
pub const PASSBY_RESPONSE: u8 = 17;
pub const PASSBY_ERROR: u8 = 18;

pub const ERROR_SENSOR: u8 = 1;
pub const ERROR_COMMAND: u8 = 2;

/// Longest encoded payload (pass-by STOP / AXLE).
pub const MAX_MESSAGE: usize = 10;

/// Parameters readable through the configuration protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigParam {
    WindowLength,
    ThresholdOn,
    ThresholdOff,
    ErrorSeconds,
}

impl ConfigParam {
    pub fn header(self) -> u8 {
        match self {
            Self::WindowLength => HEADER_WINDOW_LENGTH,
            Self::ThresholdOn => HEADER_THRESHOLD_ON,
            Self::ThresholdOff => HEADER_THRESHOLD_OFF,
            Self::ErrorSeconds => HEADER_ERROR_SECONDS,
        }
    }

    fn from_header(h: u8) -> Option<Self> {
        match h {
            HEADER_WINDOW_LENGTH => Some(Self::WindowLength),
            HEADER_THRESHOLD_ON => Some(Self::ThresholdOn),
            HEADER_THRESHOLD_OFF => Some(Self::ThresholdOff),
            HEADER_ERROR_SECONDS => Some(Self::ErrorSeconds),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::WindowLength => "window_length",
            Self::ThresholdOn => "threshold_on",
            Self::ThresholdOff => "threshold_off",
            Self::ErrorSeconds => "error_seconds",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutgoingMessage {
    /// Wheel left the cell. Durations are tick counts divided by four.
    Axle { on: u8, off: u32 },
    /// Wheel stayed in the cell past the error limit.
    AxleError { off: u32 },
    SetupOk { command: u8 },
    SetupError { command: u8 },
    Report { param: ConfigParam, value: u8 },
    Echo { byte: u8 },
    PassbyStart { passby: u16, timestamp_ms: u32 },
    PassbyAxle { passby: u16, axle: u16, time_ms: u32 },
    PassbyStop { passby: u16, axles: u16, stop_time_ms: u32 },
    PassbyError { errors: u16 },
    Response { command: u8, id: u8, data: Option<u16> },
    CommandRejected { command: u8, id: u8 },
}

/// Cursor over a payload buffer.
struct Payload<'a> {
    buf: &'a mut [u8; MAX_MESSAGE],
    len: usize,
}

impl<'a> Payload<'a> {
    fn new(buf: &'a mut [u8; MAX_MESSAGE]) -> Self {
        Self { buf, len: 0 }
    }

    fn u8(mut self, v: u8) -> Self {
        self.buf[self.len] = v;
        self.len += 1;
        self
    }

    fn u16(mut self, v: u16) -> Self {
        self.buf[self.len..self.len + 2].copy_from_slice(&v.to_le_bytes());
        self.len += 2;
        self
    }

    fn u32(mut self, v: u32) -> Self {
        self.buf[self.len..self.len + 4].copy_from_slice(&v.to_le_bytes());
        self.len += 4;
        self
    }

    fn done(self) -> usize {
        self.len
    }
}

impl OutgoingMessage {
    /// Serialize into `buf` and return the number of bytes written.
    pub fn encode(&self, buf: &mut [u8; MAX_MESSAGE]) -> usize {
        let p = Payload::new(buf);
        let written = match *self {
            Self::Axle { on, off } => p.u8(HEADER_AXLE).u8(on).u32(off),
            Self::AxleError { off } => p.u8(HEADER_AXLE_ERROR).u32(off),
            Self::SetupOk { command } => p.u8(HEADER_SETUP_OK).u8(command),
            Self::SetupError { command } => p.u8(HEADER_SETUP_ERROR).u8(command),
            Self::Report { param, value } => p.u8(param.header()).u8(value),
            Self::Echo { byte } => p.u8(HEADER_ECHO).u8(byte),
            Self::PassbyStart {
                passby,
                timestamp_ms,
            } => p
                .u8(ADDRESS_TO_MASTER)
                .u8(PASSBY_START)
                .u16(passby)
                .u32(timestamp_ms),
            Self::PassbyAxle {
                passby,
                axle,
                time_ms,
            } => p
                .u8(ADDRESS_TO_MASTER)
                .u8(PASSBY_AXLE)
                .u16(passby)
                .u16(axle)
                .u32(time_ms),
            Self::PassbyStop {
                passby,
                axles,
                stop_time_ms,
            } => p
                .u8(ADDRESS_TO_MASTER)
                .u8(PASSBY_STOP)
                .u16(passby)
                .u16(axles)
                .u32(stop_time_ms),
            Self::PassbyError { errors } => p
                .u8(ADDRESS_TO_MASTER)
                .u8(PASSBY_ERROR)
                .u8(ERROR_SENSOR)
                .u16(errors),
            Self::Response { command, id, data } => {
                let p = p
                    .u8(ADDRESS_TO_MASTER)
                    .u8(PASSBY_RESPONSE)
                    .u8(command)
                    .u8(id);
                match data {
                    Some(v) => p.u16(v),
                    None => p,
                }
            }
            Self::CommandRejected { command, id } => p
                .u8(ADDRESS_TO_MASTER)
                .u8(PASSBY_ERROR)
                .u8(ERROR_COMMAND)
                .u8(command)
                .u8(id),
        };
        written.done()
    }

    /// Encode into a fresh buffer, returning it with its length.
    pub fn to_payload(&self) -> ([u8; MAX_MESSAGE], usize) {
        let mut buf = [0u8; MAX_MESSAGE];
        let n = self.encode(&mut buf);
        (buf, n)
    }

    /// Parse a de-framed payload back into a message.
    pub fn decode(payload: &[u8]) -> Result<Self, CoreError> {
        let Some((&head, rest)) = payload.split_first() else {
            return Err(CoreError::Decode("empty payload".into()));
        };
        let msg = match (head, rest.len()) {
            (HEADER_AXLE, 5) => Self::Axle {
                on: rest[0],
                off: le_u32(&rest[1..5]),
            },
            (HEADER_AXLE_ERROR, 4) => Self::AxleError {
                off: le_u32(&rest[0..4]),
            },
            (HEADER_SETUP_OK, 1) => Self::SetupOk { command: rest[0] },
            (HEADER_SETUP_ERROR, 1) => Self::SetupError { command: rest[0] },
            (HEADER_ECHO, 1) => Self::Echo { byte: rest[0] },
            (ADDRESS_TO_MASTER, _) => return decode_passby(rest),
            (h, 1) => match ConfigParam::from_header(h) {
                Some(param) => Self::Report {
                    param,
                    value: rest[0],
                },
                None => return Err(unknown(payload)),
            },
            _ => return Err(unknown(payload)),
        };
        Ok(msg)
    }
}

fn decode_passby(rest: &[u8]) -> Result<OutgoingMessage, CoreError> {
    let Some((&kind, body)) = rest.split_first() else {
        return Err(CoreError::Decode("pass-by message without header".into()));
    };
    let msg = match (kind, body.len()) {
        (PASSBY_START, 6) => OutgoingMessage::PassbyStart {
            passby: le_u16(&body[0..2]),
            timestamp_ms: le_u32(&body[2..6]),
        },
        (PASSBY_AXLE, 8) => OutgoingMessage::PassbyAxle {
            passby: le_u16(&body[0..2]),
            axle: le_u16(&body[2..4]),
            time_ms: le_u32(&body[4..8]),
        },
        (PASSBY_STOP, 8) => OutgoingMessage::PassbyStop {
            passby: le_u16(&body[0..2]),
            axles: le_u16(&body[2..4]),
            stop_time_ms: le_u32(&body[4..8]),
        },
        (PASSBY_ERROR, 3) if body[0] == ERROR_SENSOR => OutgoingMessage::PassbyError {
            errors: le_u16(&body[1..3]),
        },
        (PASSBY_ERROR, 3) if body[0] == ERROR_COMMAND => OutgoingMessage::CommandRejected {
            command: body[1],
            id: body[2],
        },
        (PASSBY_RESPONSE, 2) => OutgoingMessage::Response {
            command: body[0],
            id: body[1],
            data: None,
        },
        (PASSBY_RESPONSE, 4) => OutgoingMessage::Response {
            command: body[0],
            id: body[1],
            data: Some(le_u16(&body[2..4])),
        },
        _ => {
            return Err(CoreError::Decode(format!(
                "unknown pass-by message kind {kind} with {} data bytes",
                body.len()
            )));
        }
    };
    Ok(msg)
}

fn unknown(payload: &[u8]) -> CoreError {
    CoreError::Decode(format!(
        "unknown header 0x{:02X} with {} bytes",
        payload[0],
        payload.len()
    ))
}

fn le_u16(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axle_report_layout() {
        let (buf, n) = OutgoingMessage::Axle {
            on: 0x12,
            off: 0x0403_0201,
        }
        .to_payload();
        assert_eq!(&buf[..n], &[HEADER_AXLE, 0x12, 0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn stop_layout_has_address_first() {
        let (buf, n) = OutgoingMessage::PassbyStop {
            passby: 3,
            axles: 2,
            stop_time_ms: 1500,
        }
        .to_payload();
        assert_eq!(n, MAX_MESSAGE);
        assert_eq!(&buf[..n], &[0x10, 2, 3, 0, 2, 0, 0xDC, 0x05, 0, 0]);
    }

    #[test]
    fn error_kinds_share_a_header() {
        let (a, na) = OutgoingMessage::PassbyError { errors: 1 }.to_payload();
        let (b, nb) = OutgoingMessage::CommandRejected { command: 9, id: 4 }.to_payload();
        assert_eq!(&a[..na], &[0x10, 18, 1, 1, 0]);
        assert_eq!(&b[..nb], &[0x10, 18, 2, 9, 4]);
        assert_eq!(
            OutgoingMessage::decode(&b[..nb]).unwrap(),
            OutgoingMessage::CommandRejected { command: 9, id: 4 }
        );
    }

    #[test]
    fn decode_rejects_truncated_payloads() {
        assert!(OutgoingMessage::decode(&[]).is_err());
        assert!(OutgoingMessage::decode(&[HEADER_AXLE, 1, 2]).is_err());
        assert!(OutgoingMessage::decode(&[0x10]).is_err());
        assert!(OutgoingMessage::decode(&[0x10, PASSBY_START, 1]).is_err());
        assert!(OutgoingMessage::decode(&[0x42, 1]).is_err());
    }
}
