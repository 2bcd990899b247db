//! Periodic tick source.
//!
//! Spawns a thread that owns the `CellInput`, samples it at `tick_hz` and
//! feeds each level into the tick handler. Cell read failures are forwarded
//! through a bounded channel; the last good level is used for that tick.
//!
//! Each `Ticker` spawns exactly one thread, which is shut down and joined
//! when the `Ticker` is dropped.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use axle_traits::{CellInput, Clock};

use crate::controller::TickHandle;
use crate::error::CoreError;
use crate::hw_error::map_hw_error;

pub struct Ticker {
    faults: xch::Receiver<CoreError>,
    ticks: Arc<AtomicU64>,
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Ticker {
    /// Start ticking. With `max_ticks` the thread stops on its own after that
    /// many ticks.
    pub fn spawn<I, C>(
        mut cell: I,
        handle: TickHandle,
        hz: u32,
        clock: C,
        max_ticks: Option<u64>,
    ) -> Self
    where
        I: CellInput + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (tx, faults) = xch::bounded(8);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let finished = Arc::new(AtomicBool::new(false));
        let finished_clone = finished.clone();
        let ticks = Arc::new(AtomicU64::new(0));
        let ticks_clone = ticks.clone();
        let period = Duration::from_micros(crate::util::period_us(hz));

        let join_handle = std::thread::spawn(move || {
            let mut level = false;
            let mut next = clock.now() + period;
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("Ticker thread received shutdown signal");
                    break;
                }
                let done = ticks_clone.load(Ordering::Relaxed);
                if max_ticks.is_some_and(|max| done >= max) {
                    tracing::debug!(ticks = done, "Ticker reached its tick budget");
                    break;
                }

                match cell.is_blocked() {
                    Ok(blocked) => level = blocked,
                    Err(e) => {
                        let err = map_hw_error(&*e);
                        // Full channel: the consumer already has faults to look at
                        if tx.try_send(err).is_err() {
                            tracing::trace!("fault channel full");
                        }
                    }
                }
                handle.on_tick(level);
                ticks_clone.fetch_add(1, Ordering::Relaxed);

                clock.sleep_until(next);
                next += period;
                let now = clock.now();
                if now > next + period {
                    // Fell more than a period behind; do not try to catch up
                    tracing::trace!(behind = ?now.duration_since(next), "tick overrun");
                    next = now + period;
                }
            }
            finished_clone.store(true, Ordering::Release);
            tracing::trace!("Ticker thread exiting cleanly");
        });

        Self {
            faults,
            ticks,
            shutdown,
            finished,
            join_handle: Some(join_handle),
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// True once the thread has left its loop.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Next cell fault reported by the thread, if any.
    pub fn take_fault(&self) -> Option<CoreError> {
        self.faults.try_recv().ok()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("Ticker thread joined successfully");
                }
                Err(e) => {
                    // Thread panicked; log but don't propagate (we're in Drop)
                    tracing::warn!(?e, "Ticker thread panicked during shutdown");
                }
            }
        }
    }
}
