//! Drive a controller: synchronously from a recorded trace, or live with a
//! ticker thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axle_config::TraceTick;
use axle_traits::{CellInput, Clock, ControlInput, ControlLines, SerialPort};
use eyre::WrapErr;

use crate::controller::Controller;
use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::message::OutgoingMessage;
use crate::session::{Counters, SessionState};
use crate::ticker::Ticker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub messages: u64,
    pub counters: Counters,
    pub overruns: u32,
    pub cell_faults: u64,
    pub final_state: SessionState,
}

fn summarize<P: SerialPort>(c: &Controller<P>, ticks: u64, cell_faults: u64) -> RunSummary {
    RunSummary {
        ticks,
        messages: c.messages_sent(),
        counters: c.counters(),
        overruns: c.overruns(),
        cell_faults,
        final_state: c.session_state(),
    }
}

/// Replay a trace one tick at a time: tick handler first, then one poll.
/// The wake line is held high so the device never sleeps.
pub fn replay<P, F>(
    controller: &mut Controller<P>,
    trace: &[TraceTick],
    mut on_message: F,
) -> Result<RunSummary>
where
    P: SerialPort,
    F: FnMut(u64, &OutgoingMessage),
{
    let handle = controller.tick_handle();
    for (i, t) in trace.iter().enumerate() {
        handle.on_tick(t.blocked);
        let lines = ControlLines {
            arm: t.arm,
            wake: true,
        };
        let tick = i as u64 + 1;
        for msg in controller
            .poll(lines)
            .wrap_err_with(|| format!("replay failed at tick {tick}"))?
        {
            on_message(tick, &msg);
        }
    }
    Ok(summarize(controller, handle.ticks(), 0))
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Stop after this many ticks; run until `shutdown` otherwise.
    pub max_ticks: Option<u64>,
    pub poll_interval: Duration,
}

/// Run live: a ticker thread samples `cell`, this thread polls the control
/// lines and the controller until `shutdown` is raised or the tick budget is
/// spent.
pub fn run<P, I, L, C, F>(
    controller: &mut Controller<P>,
    cell: I,
    mut lines: L,
    clock: C,
    opts: RunOptions,
    shutdown: &AtomicBool,
    mut on_message: F,
) -> Result<RunSummary>
where
    P: SerialPort,
    I: CellInput + Send + 'static,
    L: ControlInput,
    C: Clock + Clone + Send + Sync + 'static,
    F: FnMut(u64, &OutgoingMessage),
{
    let ticker = Ticker::spawn(
        cell,
        controller.tick_handle(),
        controller.tick_hz(),
        clock.clone(),
        opts.max_ticks,
    );
    tracing::info!(tick_hz = controller.tick_hz(), max_ticks = ?opts.max_ticks, "run started");
    let mut cell_faults = 0u64;
    loop {
        // Read before polling so the final poll sees every tick
        let finished = ticker.is_finished();
        while let Some(fault) = ticker.take_fault() {
            cell_faults += 1;
            tracing::warn!(error = %fault, "cell read failed");
        }
        let l = lines
            .lines()
            .map_err(|e| map_hw_error(&*e))
            .wrap_err("reading control lines")?;
        for msg in controller.poll(l)? {
            on_message(ticker.ticks(), &msg);
        }
        if finished || shutdown.load(Ordering::Relaxed) {
            break;
        }
        clock.sleep(opts.poll_interval);
    }
    let ticks = ticker.ticks();
    drop(ticker);
    let summary = summarize(controller, ticks, cell_faults);
    tracing::info!(?summary, "run finished");
    Ok(summary)
}
