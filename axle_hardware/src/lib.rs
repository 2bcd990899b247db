pub mod error;
pub mod util;

#[cfg(feature = "hardware")]
pub mod gpio;
#[cfg(feature = "hardware")]
pub mod uart;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use axle_traits::{BoxError, CellInput, ControlInput, ControlLines, SerialPort};

#[cfg(feature = "hardware")]
pub use gpio::{GpioCell, GpioLines};
#[cfg(feature = "hardware")]
pub use uart::UartSerial;

/// Simulated cell that plays back a fixed level sequence, one level per read.
///
/// After the script runs out the last level is held, unless the cell was built
/// with [`ScriptedCell::cycle`], in which case it starts over.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCell {
    levels: Vec<bool>,
    pos: usize,
    cycle: bool,
}

impl ScriptedCell {
    pub fn new(levels: Vec<bool>) -> Self {
        Self {
            levels,
            pos: 0,
            cycle: false,
        }
    }

    /// Synthetic pass-by: `lead` clear reads, then `axles` blocked runs of
    /// `on` reads separated by `gap` clear reads, then `gap` clear reads.
    pub fn passby(axles: usize, lead: usize, on: usize, gap: usize) -> Self {
        let mut levels = vec![false; lead];
        for i in 0..axles {
            if i > 0 {
                levels.extend(std::iter::repeat_n(false, gap));
            }
            levels.extend(std::iter::repeat_n(true, on));
        }
        levels.extend(std::iter::repeat_n(false, gap));
        Self::new(levels)
    }

    pub fn cycle(mut self) -> Self {
        self.cycle = true;
        self
    }

    pub fn remaining(&self) -> usize {
        self.levels.len().saturating_sub(self.pos)
    }
}

impl CellInput for ScriptedCell {
    fn is_blocked(&mut self) -> Result<bool, BoxError> {
        if self.levels.is_empty() {
            return Ok(false);
        }
        if self.pos >= self.levels.len() {
            if self.cycle {
                self.pos = 0;
            } else {
                return Ok(self.levels[self.levels.len() - 1]);
            }
        }
        let level = self.levels[self.pos];
        self.pos += 1;
        Ok(level)
    }
}

/// Simulated arm/wake lines. Clones share state, so one copy can be handed to
/// the controller while another is flipped by a test or a signal handler.
#[derive(Debug, Clone, Default)]
pub struct SimulatedLines {
    arm: Arc<AtomicBool>,
    wake: Arc<AtomicBool>,
}

impl SimulatedLines {
    pub fn new(initial: ControlLines) -> Self {
        Self {
            arm: Arc::new(AtomicBool::new(initial.arm)),
            wake: Arc::new(AtomicBool::new(initial.wake)),
        }
    }

    pub fn set_arm(&self, arm: bool) {
        self.arm.store(arm, Ordering::Relaxed);
    }

    pub fn set_wake(&self, wake: bool) {
        self.wake.store(wake, Ordering::Relaxed);
    }
}

impl ControlInput for SimulatedLines {
    fn lines(&mut self) -> Result<ControlLines, BoxError> {
        Ok(ControlLines {
            arm: self.arm.load(Ordering::Relaxed),
            wake: self.wake.load(Ordering::Relaxed),
        })
    }
}

/// In-memory serial port: transmitted bytes accumulate in a buffer that can be
/// inspected, and inbound bytes are injected with [`LoopbackSerial::push_rx`].
#[derive(Debug, Clone, Default)]
pub struct LoopbackSerial {
    tx: Arc<Mutex<Vec<u8>>>,
    rx: Arc<Mutex<VecDeque<u8>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LoopbackSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rx(&self, bytes: &[u8]) {
        lock(&self.rx).extend(bytes.iter().copied());
    }

    /// Copy of everything transmitted so far.
    pub fn sent(&self) -> Vec<u8> {
        lock(&self.tx).clone()
    }

    /// Drain the transmit buffer.
    pub fn take_sent(&self) -> Vec<u8> {
        std::mem::take(&mut *lock(&self.tx))
    }
}

impl SerialPort for LoopbackSerial {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        tracing::trace!(len = bytes.len(), "loopback tx");
        lock(&self.tx).extend_from_slice(bytes);
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, BoxError> {
        Ok(lock(&self.rx).pop_front())
    }
}
