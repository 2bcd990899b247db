//! Ticker thread lifecycle and the live run loop.
//!
//! Verifies that:
//! - the thread is joined when the Ticker is dropped
//! - a tick budget stops the thread on its own
//! - cell faults reach the consumer without stopping ticks

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use axle_core::mocks::FailingCell;
use axle_core::runner::{RunOptions, run};
use axle_core::ticker::Ticker;
use axle_core::{Controller, CoreError, SessionState};
use axle_hardware::{LoopbackSerial, ScriptedCell, SimulatedLines};
use axle_traits::ControlLines;
use axle_traits::clock::{ManualClock, MonotonicClock};

fn controller() -> Controller<LoopbackSerial> {
    Controller::builder()
        .with_port(LoopbackSerial::new())
        .build()
        .unwrap()
}

fn wait_finished(t: &Ticker) {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while !t.is_finished() {
        assert!(std::time::Instant::now() < deadline, "ticker never finished");
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn ticker_thread_exits_on_drop() {
    let c = controller();
    let ticker = Ticker::spawn(
        ScriptedCell::new(vec![false]),
        c.tick_handle(),
        2000,
        MonotonicClock::new(),
        None,
    );
    std::thread::sleep(Duration::from_millis(20));
    let start = std::time::Instant::now();
    drop(ticker);
    assert!(start.elapsed() < Duration::from_millis(200));
    // The handle still works after the thread is gone
    assert!(c.tick_handle().ticks() > 0);
}

#[test]
fn tick_budget_stops_the_thread() {
    let c = controller();
    let ticker = Ticker::spawn(
        ScriptedCell::passby(2, 10, 20, 30),
        c.tick_handle(),
        1000,
        ManualClock::new(),
        Some(250),
    );
    wait_finished(&ticker);
    assert_eq!(ticker.ticks(), 250);
    assert_eq!(c.tick_handle().ticks(), 250);
    assert!(ticker.take_fault().is_none());
}

#[test]
fn cell_faults_are_forwarded() {
    let c = controller();
    let ticker = Ticker::spawn(FailingCell, c.tick_handle(), 1000, ManualClock::new(), Some(20));
    wait_finished(&ticker);
    assert_eq!(ticker.ticks(), 20);
    assert_eq!(
        ticker.take_fault(),
        Some(CoreError::Hardware("cell input unavailable".into()))
    );
}

#[test]
fn run_spends_the_tick_budget() {
    let mut c = controller();
    let shutdown = AtomicBool::new(false);
    let summary = run(
        &mut c,
        ScriptedCell::passby(3, 50, 40, 60),
        SimulatedLines::new(ControlLines::ARMED),
        ManualClock::new(),
        RunOptions {
            max_ticks: Some(500),
            poll_interval: Duration::from_micros(500),
        },
        &shutdown,
        |_, _| {},
    )
    .unwrap();
    assert_eq!(summary.ticks, 500);
    assert_eq!(summary.cell_faults, 0);
    assert_ne!(summary.final_state, SessionState::Sleep);
}

#[test]
fn run_counts_cell_faults() {
    let mut c = controller();
    let shutdown = AtomicBool::new(false);
    let summary = run(
        &mut c,
        FailingCell,
        SimulatedLines::new(ControlLines::AWAKE),
        ManualClock::new(),
        RunOptions {
            max_ticks: Some(50),
            poll_interval: Duration::from_micros(500),
        },
        &shutdown,
        |_, _| {},
    )
    .unwrap();
    assert!(summary.cell_faults >= 1 && summary.cell_faults <= 50);
}

#[test]
fn raised_shutdown_stops_an_unbounded_run() {
    let mut c = controller();
    let shutdown = AtomicBool::new(true);
    let summary = run(
        &mut c,
        ScriptedCell::new(vec![false]),
        SimulatedLines::new(ControlLines::AWAKE),
        MonotonicClock::new(),
        RunOptions {
            max_ticks: None,
            poll_interval: Duration::from_millis(1),
        },
        &shutdown,
        |_, _| {},
    )
    .unwrap();
    assert_eq!(summary.final_state, SessionState::Idle);
}
