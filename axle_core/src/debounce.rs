//! Edge + one-shot timer front end.
//!
//! A raw edge moves the wheel into a pending state (PRE_ON / PRE_OFF) and
//! arms the timer; the state is only committed when the timer expires before
//! the opposite edge arrives. The same timer then bounds how long a wheel may
//! stay ON and, once the wheel is OFF, how long until the pass-by is over.

use crate::config::DebounceCfg;
use crate::wheel::{Indicators, WheelSnapshot, WheelState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Blocked,
    Cleared,
}

/// Single one-shot deadline in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct OneShot {
    deadline_ms: Option<u64>,
}

impl OneShot {
    fn arm(&mut self, now_ms: u64, delay_ms: u32) {
        self.deadline_ms = Some(now_ms.saturating_add(u64::from(delay_ms)));
    }

    fn cancel(&mut self) {
        self.deadline_ms = None;
    }

    fn take(&mut self) -> Option<u64> {
        self.deadline_ms.take()
    }

    fn expired(&self, now_ms: u64) -> bool {
        self.deadline_ms.is_some_and(|d| now_ms >= d)
    }
}

#[derive(Debug, Clone)]
pub struct DebounceWheel {
    cfg: DebounceCfg,
    state: WheelState,
    timer: OneShot,
    // Stop timer interrupted by a PRE_ON that may still turn out to be a bounce
    parked_stop: Option<u64>,
    level: bool,
    axle_on_ms: u64,
    axle_off_ms: u64,
    stop_flag: bool,
    indicators: Indicators,
}

impl DebounceWheel {
    pub fn new(cfg: DebounceCfg) -> Self {
        Self {
            cfg,
            state: WheelState::Off,
            timer: OneShot::default(),
            parked_stop: None,
            level: false,
            axle_on_ms: 0,
            axle_off_ms: 0,
            stop_flag: false,
            indicators: Indicators::default(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.cfg);
    }

    pub fn state(&self) -> WheelState {
        self.state
    }

    pub fn timer_deadline(&self) -> Option<u64> {
        self.timer.deadline_ms
    }

    /// Sample-driven adaptor: detect an edge against the previous level, then
    /// service the timer.
    pub fn tick(&mut self, blocked: bool, now_ms: u64) {
        if blocked != self.level {
            self.level = blocked;
            let edge = if blocked { Edge::Blocked } else { Edge::Cleared };
            self.on_edge(edge, now_ms);
        }
        self.poll_timer(now_ms);
    }

    /// Fire the timer if its deadline has passed. Returns whether it fired.
    pub fn poll_timer(&mut self, now_ms: u64) -> bool {
        if self.timer.expired(now_ms) {
            self.timer.cancel();
            self.on_timer_expired(now_ms);
            true
        } else {
            false
        }
    }

    pub fn on_edge(&mut self, edge: Edge, now_ms: u64) {
        self.level = edge == Edge::Blocked;
        self.indicators.axle = self.level;
        let from = self.state;
        match (edge, self.state) {
            (Edge::Blocked, WheelState::Off) => {
                self.state = WheelState::PreOn;
                self.parked_stop = self.timer.take();
                self.timer.arm(now_ms, self.cfg.on_delay_ms);
                self.axle_on_ms = now_ms;
            }
            (Edge::Blocked, WheelState::PreOff) => {
                self.state = WheelState::On;
                self.timer.arm(now_ms, self.cfg.max_on_ms);
            }
            (Edge::Cleared, WheelState::PreOn) => {
                self.state = WheelState::Off;
                self.timer.deadline_ms = self.parked_stop.take();
            }
            (Edge::Cleared, WheelState::On) => {
                self.state = WheelState::PreOff;
                self.timer.arm(now_ms, self.cfg.off_delay_ms);
                self.axle_off_ms = now_ms;
            }
            (Edge::Cleared, WheelState::OnError) => {
                self.state = WheelState::Off;
                self.timer.cancel();
                self.indicators.error = false;
            }
            _ => {}
        }
        if from != self.state {
            tracing::trace!(?edge, ?from, to = ?self.state, now_ms, "debounce edge");
        }
    }

    pub fn on_timer_expired(&mut self, now_ms: u64) {
        match self.state {
            WheelState::Off => {
                self.stop_flag = true;
                tracing::debug!(now_ms, "stop timeout");
            }
            WheelState::PreOn => {
                self.state = WheelState::On;
                self.parked_stop = None;
                self.stop_flag = false;
                self.timer.arm(now_ms, self.cfg.max_on_ms);
            }
            WheelState::PreOff => {
                self.state = WheelState::Off;
                self.timer.arm(now_ms, self.cfg.stop_ms);
            }
            WheelState::On => {
                self.state = WheelState::OnError;
                self.indicators.error = true;
                tracing::debug!(now_ms, "wheel stuck on");
            }
            WheelState::OnError => {}
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
