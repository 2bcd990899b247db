//! Test and helper mocks for axle_core

use axle_traits::{BoxError, CellInput, SerialPort};

/// A serial port whose writes always fail; inbound is always empty.
pub struct FailingPort;

impl SerialPort for FailingPort {
    fn write_all(&mut self, _bytes: &[u8]) -> Result<(), BoxError> {
        Err(Box::new(std::io::Error::other("uart write timeout")))
    }

    fn read_byte(&mut self) -> Result<Option<u8>, BoxError> {
        Ok(None)
    }
}

/// A cell that errors on every read.
pub struct FailingCell;

impl CellInput for FailingCell {
    fn is_blocked(&mut self) -> Result<bool, BoxError> {
        Err(Box::new(std::io::Error::other("cell input unavailable")))
    }
}
