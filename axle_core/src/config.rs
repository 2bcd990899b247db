//! Configuration types for the detection engine.
//!
//! These are the runtime configuration structs used by the controller.
//! They are separate from the TOML-deserialized config in `axle_config`.

/// Divisor applied to on/off tick counts before they go on the wire.
pub const WHEEL_COUNTER_SCALING: u32 = 4;

/// Moving-sum detection thresholds. Owned by the main loop; a copy is handed
/// to the tick context every time detection is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Number of samples summed (1..=32).
    pub window_length: u8,
    /// OFF → ON once `sum > window_length - threshold_on`.
    pub threshold_on: u8,
    /// ON → OFF once `sum < threshold_off`.
    pub threshold_off: u8,
    /// ON longer than this many seconds is a sensor fault.
    pub error_seconds: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            window_length: 4,
            threshold_on: 1,
            threshold_off: 1,
            error_seconds: 2,
        }
    }
}

impl Thresholds {
    /// Fault limit in ticks.
    #[inline]
    pub fn error_ticks(&self, tick_hz: u32) -> u32 {
        u32::from(self.error_seconds).saturating_mul(tick_hz)
    }

    /// Exclusive upper bound for both thresholds.
    #[inline]
    pub fn half_window(&self) -> u8 {
        self.window_length / 2
    }
}

/// Edge + one-shot timer front end timing, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceCfg {
    pub on_delay_ms: u32,
    pub off_delay_ms: u32,
    pub max_on_ms: u32,
    pub stop_ms: u32,
}

impl Default for DebounceCfg {
    fn default() -> Self {
        Self {
            on_delay_ms: 3,
            off_delay_ms: 3,
            max_on_ms: 1000,
            stop_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrontEndKind {
    #[default]
    MovingSum,
    Debounce,
}

/// What the device reports while armed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportMode {
    /// Raw per-axle reports straight from the tick handler.
    Axle,
    /// START / AXLE / STOP / ERROR pass-by events.
    #[default]
    Passby,
}

/// Behaviour when a message is staged over one that has not been sent yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverrunPolicy {
    /// Overwrite without a trace.
    #[default]
    Silent,
    /// Overwrite, count, and log a warning.
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCfg {
    pub front_end: FrontEndKind,
    pub report: ReportMode,
    /// Moving-sum front end: off time after an axle that raises the stop flag.
    pub stop_timeout_ms: u32,
    pub overrun: OverrunPolicy,
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            front_end: FrontEndKind::MovingSum,
            report: ReportMode::Passby,
            stop_timeout_ms: 3000,
            overrun: OverrunPolicy::Silent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingCfg {
    pub tick_hz: u32,
    pub poll_us: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            tick_hz: 2000,
            poll_us: 500,
        }
    }
}
