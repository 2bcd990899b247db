//! `From` implementations bridging `axle_config` types to `axle_core` types.

use crate::config::{
    DebounceCfg, FrontEndKind, OverrunPolicy, ReportMode, SessionCfg, Thresholds, TimingCfg,
};

// ── Thresholds ───────────────────────────────────────────────────────────────

impl From<&axle_config::Thresholds> for Thresholds {
    fn from(c: &axle_config::Thresholds) -> Self {
        Self {
            window_length: c.window_length,
            threshold_on: c.threshold_on,
            threshold_off: c.threshold_off,
            error_seconds: c.error_seconds,
        }
    }
}

// ── DebounceCfg ──────────────────────────────────────────────────────────────

impl From<&axle_config::Debounce> for DebounceCfg {
    fn from(c: &axle_config::Debounce) -> Self {
        Self {
            on_delay_ms: c.on_delay_ms,
            off_delay_ms: c.off_delay_ms,
            max_on_ms: c.max_on_ms,
            stop_ms: c.stop_ms,
        }
    }
}

// ── SessionCfg ───────────────────────────────────────────────────────────────

impl From<axle_config::FrontEnd> for FrontEndKind {
    fn from(c: axle_config::FrontEnd) -> Self {
        match c {
            axle_config::FrontEnd::MovingSum => Self::MovingSum,
            axle_config::FrontEnd::Debounce => Self::Debounce,
        }
    }
}

impl From<axle_config::Report> for ReportMode {
    fn from(c: axle_config::Report) -> Self {
        match c {
            axle_config::Report::Axle => Self::Axle,
            axle_config::Report::Passby => Self::Passby,
        }
    }
}

impl From<axle_config::Overrun> for OverrunPolicy {
    fn from(c: axle_config::Overrun) -> Self {
        match c {
            axle_config::Overrun::Silent => Self::Silent,
            axle_config::Overrun::Count => Self::Count,
        }
    }
}

impl From<&axle_config::Session> for SessionCfg {
    fn from(c: &axle_config::Session) -> Self {
        Self {
            front_end: c.front_end.into(),
            report: c.report.into(),
            stop_timeout_ms: c.stop_timeout_ms,
            overrun: c.overrun.into(),
        }
    }
}

// ── TimingCfg ────────────────────────────────────────────────────────────────

impl From<&axle_config::Timing> for TimingCfg {
    fn from(c: &axle_config::Timing) -> Self {
        Self {
            tick_hz: c.tick_hz,
            poll_us: c.poll_us,
        }
    }
}
