//! Windowed sum of recent binary samples.
//!
//! The backing ring is a fixed `[u16; MAX_WINDOW]`; only the first
//! `window_length` slots are live. The running sum is updated incrementally
//! (add the new sample, subtract the evicted one) and recomputed only by
//! `setup`, which zeroes the whole ring.

use crate::error::CoreError;

/// Capacity of the backing ring.
pub const MAX_WINDOW: usize = 32;

#[derive(Debug, Clone)]
pub struct MovingSum {
    ring: [u16; MAX_WINDOW],
    len: usize,
    index: usize,
    sum: u32,
}

impl Default for MovingSum {
    fn default() -> Self {
        Self::new()
    }
}

impl MovingSum {
    /// Zeroed filter with a window of one. Call [`MovingSum::setup`] before use.
    pub const fn new() -> Self {
        Self {
            ring: [0; MAX_WINDOW],
            len: 1,
            index: 0,
            sum: 0,
        }
    }

    /// Zero the full ring and select a new window. Rejects `0` and anything
    /// above [`MAX_WINDOW`], leaving the filter untouched.
    pub fn setup(&mut self, window_length: usize) -> Result<(), CoreError> {
        if !(1..=MAX_WINDOW).contains(&window_length) {
            return Err(CoreError::Config(format!(
                "moving sum window must be in [1, {MAX_WINDOW}], got {window_length}"
            )));
        }
        self.ring = [0; MAX_WINDOW];
        self.len = window_length;
        self.index = 0;
        self.sum = 0;
        Ok(())
    }

    /// Push one sample and return the updated sum.
    #[inline]
    pub fn run(&mut self, sample: u16) -> u32 {
        self.index = (self.index + 1) % self.len;
        let evicted = self.ring[self.index];
        // The evicted sample is part of `sum`, so this cannot underflow
        self.sum = self.sum + u32::from(sample) - u32::from(evicted);
        self.ring[self.index] = sample;
        self.sum
    }

    #[inline]
    pub fn sum(&self) -> u32 {
        self.sum
    }

    #[inline]
    pub fn window_length(&self) -> usize {
        self.len
    }
}
