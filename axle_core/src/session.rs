//! Pass-by session state machine.
//!
//! Runs in the main loop. Each poll it looks at the control lines and a
//! wheel snapshot, advances, and may produce one outgoing message plus one
//! request for the tick context (arm, disarm, acknowledge the stop flag).

use axle_traits::ControlLines;

use crate::config::ReportMode;
use crate::message::OutgoingMessage;
use crate::util::{midpoint_ms, wire_ms};
use crate::wheel::{WheelSnapshot, WheelState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Sleep,
    Idle,
    Ready,
    PassbyOn,
    PassbyOff,
    Error,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sleep => "sleep",
            Self::Idle => "idle",
            Self::Ready => "ready",
            Self::PassbyOn => "passby_on",
            Self::PassbyOff => "passby_off",
            Self::Error => "error",
        }
    }

    /// Detection runs in every state from `Ready` on.
    pub fn is_armed(self) -> bool {
        !matches!(self, Self::Sleep | Self::Idle)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Axles of the pass-by in progress.
    pub axles: u16,
    pub passbys: u16,
    pub errors: u16,
}

/// Request for the tick context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorRequest {
    Arm,
    Disarm,
    ClearStop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Step {
    pub message: Option<OutgoingMessage>,
    pub request: Option<SensorRequest>,
}

impl Step {
    fn request(r: SensorRequest) -> Self {
        Self {
            message: None,
            request: Some(r),
        }
    }

    fn message(m: OutgoingMessage) -> Self {
        Self {
            message: Some(m),
            request: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
    counters: Counters,
    report: ReportMode,
    // Time the first wheel of the current pass-by entered the cell
    origin_ms: u64,
}

impl Session {
    pub fn new(report: ReportMode) -> Self {
        Self {
            report,
            ..Self::default()
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn reset_counters(&mut self) {
        self.counters = Counters::default();
    }

    pub fn step(&mut self, lines: ControlLines, wheel: &WheelSnapshot) -> Step {
        let from = self.state;
        let step = match self.state {
            SessionState::Sleep => {
                if lines.awake() {
                    self.state = SessionState::Idle;
                }
                Step::default()
            }
            SessionState::Idle => {
                if lines.arm {
                    self.state = SessionState::Ready;
                    self.counters.axles = 0;
                    Step::request(SensorRequest::Arm)
                } else {
                    if !lines.wake {
                        self.state = SessionState::Sleep;
                    }
                    Step::default()
                }
            }
            SessionState::Ready => self.ready(lines, wheel),
            SessionState::PassbyOn => self.passby_on(wheel),
            SessionState::PassbyOff => self.passby_off(lines, wheel),
            SessionState::Error => {
                if wheel.state == WheelState::Off {
                    self.state = SessionState::Ready;
                    self.counters.axles = 0;
                    Step::default()
                } else if !lines.arm {
                    self.state = SessionState::Idle;
                    self.counters.axles = 0;
                    Step::request(SensorRequest::Disarm)
                } else {
                    Step::default()
                }
            }
        };
        if from != self.state {
            tracing::debug!(
                from = from.as_str(),
                to = self.state.as_str(),
                wheel = ?wheel.state,
                "session transition"
            );
        }
        step
    }

    fn ready(&mut self, lines: ControlLines, wheel: &WheelSnapshot) -> Step {
        if self.report == ReportMode::Passby {
            match wheel.state {
                WheelState::On => {
                    self.state = SessionState::PassbyOn;
                    return Step::default();
                }
                WheelState::PreOn => return Step::default(),
                _ => {}
            }
        }
        if !lines.arm {
            self.state = SessionState::Idle;
            return Step::request(SensorRequest::Disarm);
        }
        Step::default()
    }

    fn passby_on(&mut self, wheel: &WheelSnapshot) -> Step {
        match wheel.state {
            WheelState::Off => {
                self.state = SessionState::PassbyOff;
                if self.counters.axles == 0 {
                    self.counters.passbys = self.counters.passbys.wrapping_add(1);
                    self.counters.axles = 1;
                    self.origin_ms = wheel.axle_on_ms;
                    Step::message(OutgoingMessage::PassbyStart {
                        passby: self.counters.passbys,
                        timestamp_ms: wire_ms(self.origin_ms),
                    })
                } else {
                    self.counters.axles = self.counters.axles.saturating_add(1);
                    let mid = midpoint_ms(wheel.axle_on_ms, wheel.axle_off_ms);
                    Step::message(OutgoingMessage::PassbyAxle {
                        passby: self.counters.passbys,
                        axle: self.counters.axles,
                        time_ms: wire_ms(mid.saturating_sub(self.origin_ms)),
                    })
                }
            }
            WheelState::OnError => {
                self.state = SessionState::Error;
                self.counters.errors = self.counters.errors.saturating_add(1);
                Step::message(OutgoingMessage::PassbyError {
                    errors: self.counters.errors,
                })
            }
            WheelState::PreOn | WheelState::On | WheelState::PreOff => Step::default(),
        }
    }

    fn passby_off(&mut self, lines: ControlLines, wheel: &WheelSnapshot) -> Step {
        if wheel.state == WheelState::On {
            self.state = SessionState::PassbyOn;
            return Step::default();
        }
        if wheel.stop_flag || !lines.arm {
            let msg = OutgoingMessage::PassbyStop {
                passby: self.counters.passbys,
                axles: self.counters.axles,
                stop_time_ms: wire_ms(wheel.now_ms.saturating_sub(self.origin_ms)),
            };
            self.state = SessionState::Ready;
            self.counters.axles = 0;
            return Step {
                message: Some(msg),
                request: Some(SensorRequest::ClearStop),
            };
        }
        Step::default()
    }
}
