//! Type-state builder for `Controller`.
//!
//! The builder enforces at compile time that a serial port is provided
//! before `build()` is available. `try_build()` is always available for
//! dynamic checks.

use std::marker::PhantomData;

use axle_traits::SerialPort;

use crate::config::{
    DebounceCfg, FrontEndKind, ReportMode, SessionCfg, Thresholds, TimingCfg,
};
use crate::controller::{Controller, Sensor};
use crate::error::{BuildError, Result};
use crate::mailbox::Mailbox;
use crate::moving_sum::MAX_WINDOW;
use crate::session::Session;
use crate::wheel::FrontEnd;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Controller`. All fields are validated on `build()`.
pub struct ControllerBuilder<P, S> {
    port: Option<P>,
    thresholds: Thresholds,
    debounce: DebounceCfg,
    session: SessionCfg,
    timing: TimingCfg,
    _s: PhantomData<S>,
}

impl<P> Default for ControllerBuilder<P, Missing> {
    fn default() -> Self {
        Self {
            port: None,
            thresholds: Thresholds::default(),
            debounce: DebounceCfg::default(),
            session: SessionCfg::default(),
            timing: TimingCfg::default(),
            _s: PhantomData,
        }
    }
}

impl<P: SerialPort> Controller<P> {
    /// Start building a Controller.
    pub fn builder() -> ControllerBuilder<P, Missing> {
        ControllerBuilder::default()
    }
}

impl<P> ControllerBuilder<P, Missing> {
    pub fn with_port(self, port: P) -> ControllerBuilder<P, Set> {
        ControllerBuilder {
            port: Some(port),
            thresholds: self.thresholds,
            debounce: self.debounce,
            session: self.session,
            timing: self.timing,
            _s: PhantomData,
        }
    }
}

impl<P, S> ControllerBuilder<P, S> {
    pub fn with_thresholds(mut self, t: Thresholds) -> Self {
        self.thresholds = t;
        self
    }

    pub fn with_debounce(mut self, d: DebounceCfg) -> Self {
        self.debounce = d;
        self
    }

    pub fn with_session(mut self, s: SessionCfg) -> Self {
        self.session = s;
        self
    }

    pub fn with_timing(mut self, t: TimingCfg) -> Self {
        self.timing = t;
        self
    }

    /// Take every runtime section from a loaded config file.
    pub fn apply_config(self, cfg: &axle_config::Config) -> Self {
        self.with_thresholds((&cfg.thresholds).into())
            .with_debounce((&cfg.debounce).into())
            .with_session((&cfg.session).into())
            .with_timing((&cfg.timing).into())
    }
}

impl<P: SerialPort, S> ControllerBuilder<P, S> {
    /// Validate and build, failing at runtime if the port is missing.
    pub fn try_build(self) -> Result<Controller<P>> {
        let port = self.port.ok_or(BuildError::MissingPort)?;
        validate_and_build(
            port,
            self.thresholds,
            self.debounce,
            self.session,
            self.timing,
        )
    }
}

impl<P: SerialPort> ControllerBuilder<P, Set> {
    pub fn build(self) -> Result<Controller<P>> {
        self.try_build()
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

/// Validate configuration and construct the controller with its tick context.
fn validate_and_build<P: SerialPort>(
    port: P,
    thresholds: Thresholds,
    debounce: DebounceCfg,
    session: SessionCfg,
    timing: TimingCfg,
) -> Result<Controller<P>> {
    // ── Validation ───────────────────────────────────────────────────────────
    if thresholds.window_length == 0 || usize::from(thresholds.window_length) > MAX_WINDOW {
        return Err(invalid("window_length must be in [1, 32]"));
    }
    if thresholds.threshold_on >= thresholds.half_window()
        || thresholds.threshold_off >= thresholds.half_window()
    {
        return Err(invalid("thresholds must be < window_length/2"));
    }
    if thresholds.error_seconds == 0 {
        return Err(invalid("error_seconds must be >= 1"));
    }
    if timing.tick_hz == 0 {
        return Err(invalid("tick_hz must be > 0"));
    }
    if timing.poll_us == 0 {
        return Err(invalid("poll_us must be >= 1"));
    }
    if debounce.on_delay_ms == 0
        || debounce.off_delay_ms == 0
        || debounce.max_on_ms == 0
        || debounce.stop_ms == 0
    {
        return Err(invalid("debounce delays must be >= 1 ms"));
    }
    if session.stop_timeout_ms == 0 {
        return Err(invalid("stop_timeout_ms must be >= 1"));
    }
    if session.report == ReportMode::Axle && session.front_end != FrontEndKind::MovingSum {
        return Err(invalid("axle reports require the moving-sum front end"));
    }

    // ── Construction ─────────────────────────────────────────────────────────
    let front_end = FrontEnd::new(
        session.front_end,
        thresholds,
        debounce,
        timing.tick_hz,
        session.stop_timeout_ms,
    );
    let sensor = Sensor::new(
        front_end,
        Mailbox::new(session.overrun),
        session.report,
        timing.tick_hz,
    );
    tracing::debug!(
        ?thresholds,
        ?debounce,
        ?session,
        tick_hz = timing.tick_hz,
        "controller built"
    );
    Ok(Controller::from_parts(
        sensor,
        Session::new(session.report),
        thresholds,
        port,
        timing.tick_hz,
    ))
}
