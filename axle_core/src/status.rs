//! Status lamp outputs derived from the session state.
//!
//! The state machines never touch indicators themselves; a driver asks for
//! the current [`Leds`] and applies them.

use crate::session::SessionState;
use crate::wheel::Indicators;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndicator {
    /// Asleep: short green pulse.
    Pulse,
    /// Idle: green blinking.
    Blink,
    /// Armed, no pass-by: green.
    Ready,
    /// Pass-by with a wheel in the cell: blue and green.
    PassbyWheel,
    /// Pass-by between wheels: blue.
    PassbyGap,
    /// Sensor fault: red.
    Fault,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Leds {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
    pub axle: bool,
}

impl From<SessionState> for StatusIndicator {
    fn from(s: SessionState) -> Self {
        match s {
            SessionState::Sleep => Self::Pulse,
            SessionState::Idle => Self::Blink,
            SessionState::Ready => Self::Ready,
            SessionState::PassbyOn => Self::PassbyWheel,
            SessionState::PassbyOff => Self::PassbyGap,
            SessionState::Error => Self::Fault,
        }
    }
}

impl StatusIndicator {
    /// Lamp levels for this status. `phase` drives the blinking patterns and
    /// `wheel` the per-axle lamp.
    pub fn leds(self, phase: bool, wheel: Indicators) -> Leds {
        let (red, green, blue) = match self {
            Self::Pulse | Self::Blink => (false, phase, false),
            Self::Ready => (false, true, false),
            Self::PassbyWheel => (false, true, true),
            Self::PassbyGap => (false, false, true),
            Self::Fault => (true, false, false),
        };
        Leds {
            red: red || wheel.error,
            green,
            blue,
            axle: wheel.axle,
        }
    }
}
