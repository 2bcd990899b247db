//! Wheel presence state machines.
//!
//! Two front ends turn the cell input into a wheel state: [`SumWheel`]
//! thresholds a moving sum every tick, [`DebounceWheel`] confirms raw edges
//! with a one-shot timer. [`FrontEnd`] wraps whichever one is configured.

use crate::config::{DebounceCfg, FrontEndKind, Thresholds, WHEEL_COUNTER_SCALING};
use crate::debounce::DebounceWheel;
use crate::error::CoreError;
use crate::message::OutgoingMessage;
use crate::moving_sum::MovingSum;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WheelState {
    #[default]
    Off,
    PreOn,
    On,
    PreOff,
    OnError,
}

/// Observable outputs of the wheel machine (the axle and error lamps).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Indicators {
    pub axle: bool,
    pub error: bool,
}

/// Copy of the tick-side state handed to the main loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WheelSnapshot {
    pub state: WheelState,
    pub now_ms: u64,
    /// When the current or last wheel entered the cell.
    pub axle_on_ms: u64,
    /// When the last wheel left the cell.
    pub axle_off_ms: u64,
    /// No wheel for the stop period after the last one.
    pub stop_flag: bool,
    pub indicators: Indicators,
}

/// Moving-sum front end: hysteresis on a windowed sum, driven every tick.
#[derive(Debug, Clone)]
pub struct SumWheel {
    filter: MovingSum,
    thresholds: Thresholds,
    error_ticks: u32,
    stop_timeout_ms: u64,
    state: WheelState,
    on_count: u32,
    off_count: u32,
    indicators: Indicators,
    axle_on_ms: u64,
    axle_off_ms: u64,
    stop_deadline_ms: Option<u64>,
    stop_flag: bool,
}

impl SumWheel {
    pub fn new(thresholds: Thresholds, tick_hz: u32, stop_timeout_ms: u32) -> Self {
        Self {
            filter: MovingSum::new(),
            thresholds,
            error_ticks: thresholds.error_ticks(tick_hz),
            stop_timeout_ms: u64::from(stop_timeout_ms),
            state: WheelState::Off,
            on_count: 0,
            off_count: 0,
            indicators: Indicators::default(),
            axle_on_ms: 0,
            axle_off_ms: 0,
            stop_deadline_ms: None,
            stop_flag: false,
        }
    }

    /// Load thresholds and restart from a zeroed filter in OFF.
    pub fn arm(&mut self, thresholds: Thresholds, tick_hz: u32) -> Result<(), CoreError> {
        self.filter.setup(usize::from(thresholds.window_length))?;
        self.thresholds = thresholds;
        self.error_ticks = thresholds.error_ticks(tick_hz);
        self.state = WheelState::Off;
        self.on_count = 0;
        self.off_count = 0;
        self.indicators = Indicators::default();
        self.stop_deadline_ms = None;
        self.stop_flag = false;
        Ok(())
    }

    pub fn state(&self) -> WheelState {
        self.state
    }

    pub fn sum(&self) -> u32 {
        self.filter.sum()
    }

    /// Feed one sample. Returns the axle or axle-error report when the tick
    /// completes one.
    pub fn tick(&mut self, blocked: bool, now_ms: u64) -> Option<OutgoingMessage> {
        let sum = self.filter.run(u16::from(blocked));
        let len = self.thresholds.window_length;
        match self.state {
            WheelState::Off => {
                self.off_count = self.off_count.saturating_add(1);
                if self.stop_deadline_ms.is_some_and(|d| now_ms >= d) {
                    self.stop_deadline_ms = None;
                    self.stop_flag = true;
                    tracing::debug!(now_ms, "stop timeout");
                }
                if sum > u32::from(len.saturating_sub(self.thresholds.threshold_on)) {
                    self.state = WheelState::On;
                    self.indicators.axle = true;
                    self.on_count = 0;
                    self.axle_on_ms = now_ms;
                    self.stop_deadline_ms = None;
                    self.stop_flag = false;
                    tracing::trace!(sum, now_ms, "wheel on");
                }
                None
            }
            WheelState::On => {
                self.on_count = self.on_count.saturating_add(1);
                if sum < u32::from(self.thresholds.threshold_off) {
                    self.state = WheelState::Off;
                    self.indicators.axle = false;
                    self.axle_off_ms = now_ms;
                    self.stop_deadline_ms = Some(now_ms.saturating_add(self.stop_timeout_ms));
                    let msg = OutgoingMessage::Axle {
                        on: u8::try_from(self.on_count / WHEEL_COUNTER_SCALING).unwrap_or(u8::MAX),
                        off: self.off_count / WHEEL_COUNTER_SCALING,
                    };
                    self.off_count = 0;
                    tracing::trace!(sum, now_ms, "wheel off");
                    Some(msg)
                } else if self.on_count > self.error_ticks {
                    self.state = WheelState::OnError;
                    self.indicators.error = true;
                    let msg = OutgoingMessage::AxleError {
                        off: self.off_count / WHEEL_COUNTER_SCALING,
                    };
                    self.off_count = 0;
                    tracing::debug!(on_ticks = self.on_count, "wheel stuck on");
                    Some(msg)
                } else {
                    None
                }
            }
            WheelState::OnError => {
                self.on_count = self.on_count.saturating_add(1);
                if sum == 0 {
                    self.state = WheelState::Off;
                    self.indicators = Indicators::default();
                    tracing::debug!(now_ms, "wheel fault cleared");
                }
                None
            }
            // Not reachable with this front end
            WheelState::PreOn | WheelState::PreOff => None,
        }
    }

    pub fn snapshot(&self, now_ms: u64) -> WheelSnapshot {
        WheelSnapshot {
            state: self.state,
            now_ms,
            axle_on_ms: self.axle_on_ms,
            axle_off_ms: self.axle_off_ms,
            stop_flag: self.stop_flag,
            indicators: self.indicators,
        }
    }

    pub fn clear_stop(&mut self) {
        self.stop_flag = false;
    }
}

/// The configured front end.
#[derive(Debug, Clone)]
pub enum FrontEnd {
    MovingSum(SumWheel),
    Debounce(DebounceWheel),
}

impl FrontEnd {
    pub fn new(
        kind: FrontEndKind,
        thresholds: Thresholds,
        debounce: DebounceCfg,
        tick_hz: u32,
        stop_timeout_ms: u32,
    ) -> Self {
        match kind {
            FrontEndKind::MovingSum => {
                Self::MovingSum(SumWheel::new(thresholds, tick_hz, stop_timeout_ms))
            }
            FrontEndKind::Debounce => Self::Debounce(DebounceWheel::new(debounce)),
        }
    }

    pub fn kind(&self) -> FrontEndKind {
        match self {
            Self::MovingSum(_) => FrontEndKind::MovingSum,
            Self::Debounce(_) => FrontEndKind::Debounce,
        }
    }

    pub fn arm(&mut self, thresholds: Thresholds, tick_hz: u32) -> Result<(), CoreError> {
        match self {
            Self::MovingSum(w) => w.arm(thresholds, tick_hz),
            Self::Debounce(w) => {
                w.reset();
                Ok(())
            }
        }
    }

    pub fn tick(&mut self, blocked: bool, now_ms: u64) -> Option<OutgoingMessage> {
        match self {
            Self::MovingSum(w) => w.tick(blocked, now_ms),
            Self::Debounce(w) => {
                w.tick(blocked, now_ms);
                None
            }
        }
    }

    pub fn state(&self) -> WheelState {
        match self {
            Self::MovingSum(w) => w.state(),
            Self::Debounce(w) => w.state(),
        }
    }

    pub fn snapshot(&self, now_ms: u64) -> WheelSnapshot {
        match self {
            Self::MovingSum(w) => w.snapshot(now_ms),
            Self::Debounce(w) => w.snapshot(now_ms),
        }
    }

    pub fn clear_stop(&mut self) {
        match self {
            Self::MovingSum(w) => w.clear_stop(),
            Self::Debounce(w) => w.clear_stop(),
        }
    }
}
