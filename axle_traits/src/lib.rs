//! Hardware abstraction seams for the axle counter.
//!
//! Everything the engine needs from the outside world goes through these
//! traits: the cell input sampled on every tick, the arm/wake control lines,
//! and a byte-duplex serial channel. Errors cross the boundary boxed so that
//! backends stay free to use their own error types.

pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Boxed error used at every trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The sensing cell (light barrier or loop detector).
pub trait CellInput {
    /// `true` while something (a wheel) blocks the cell.
    fn is_blocked(&mut self) -> Result<bool, BoxError>;
}

/// Levels of the external status lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlLines {
    /// Detection requested. Also keeps the device awake.
    pub arm: bool,
    /// Leave sleep and accept configuration.
    pub wake: bool,
}

impl ControlLines {
    pub const ARMED: Self = Self {
        arm: true,
        wake: true,
    };
    pub const AWAKE: Self = Self {
        arm: false,
        wake: true,
    };
    pub const ASLEEP: Self = Self {
        arm: false,
        wake: false,
    };

    #[inline]
    pub fn awake(&self) -> bool {
        self.arm || self.wake
    }
}

pub trait ControlInput {
    fn lines(&mut self) -> Result<ControlLines, BoxError>;
}

/// Byte-duplex serial channel.
///
/// `write_all` blocks until every byte has been handed to the transmitter, in
/// order. `read_byte` never blocks: `Ok(None)` means nothing is pending.
pub trait SerialPort {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), BoxError>;
    fn read_byte(&mut self) -> Result<Option<u8>, BoxError>;
}

impl<T: CellInput + ?Sized> CellInput for Box<T> {
    fn is_blocked(&mut self) -> Result<bool, BoxError> {
        (**self).is_blocked()
    }
}

impl<T: ControlInput + ?Sized> ControlInput for Box<T> {
    fn lines(&mut self) -> Result<ControlLines, BoxError> {
        (**self).lines()
    }
}

impl<T: SerialPort + ?Sized> SerialPort for Box<T> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        (**self).write_all(bytes)
    }
    fn read_byte(&mut self) -> Result<Option<u8>, BoxError> {
        (**self).read_byte()
    }
}
