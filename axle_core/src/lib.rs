#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core axle detection logic (hardware-agnostic).
//!
//! This crate turns a sampled cell input into axle and pass-by reports on a
//! framed serial link. All hardware interactions go through the
//! `axle_traits::CellInput`, `ControlInput` and `SerialPort` traits.
//!
//! ## Architecture
//!
//! - **Filtering**: windowed moving sum with hysteresis thresholds (`moving_sum`)
//! - **Wheel**: OFF / ON / ON_ERROR from the sum, or edge + timer debounce
//!   with PRE_ON / PRE_OFF (`wheel`, `debounce`)
//! - **Session**: SLEEP → IDLE → READY → PASSBY_ON ⇄ PASSBY_OFF, plus ERROR (`session`)
//! - **Wire**: message payloads (`message`), byte stuffing (`frame`), and the
//!   inbound configuration protocol (`command`)
//! - **Concurrency**: the tick context lives behind a short critical section
//!   (`critical`); the main loop sees it only through snapshots (`controller`)
//!
//! ## Timing
//!
//! Time is the tick count scaled by the tick rate, so a replayed trace
//! produces exactly the same timestamps as a live run.

pub mod builder;
pub mod command;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod critical;
pub mod debounce;
pub mod error;
pub mod frame;
pub mod hw_error;
pub mod mailbox;
pub mod message;
pub mod mocks;
pub mod moving_sum;
pub mod runner;
pub mod session;
pub mod status;
pub mod ticker;
pub mod util;
pub mod wheel;

pub use builder::ControllerBuilder;
pub use config::{
    DebounceCfg, FrontEndKind, OverrunPolicy, ReportMode, SessionCfg, Thresholds, TimingCfg,
};
pub use controller::{Controller, Sensor, TickHandle};
pub use error::{BuildError, CoreError, Result};
pub use message::OutgoingMessage;
pub use moving_sum::MovingSum;
pub use runner::{RunOptions, RunSummary};
pub use session::{Counters, SessionState};
pub use status::{Leds, StatusIndicator};
pub use wheel::{FrontEnd, WheelSnapshot, WheelState};
