//! Common time/period helpers for axle_core.

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;
/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Compute the period in microseconds for a given tick rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 microsecond.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    (MICROS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Milliseconds covered by `ticks` at `hz`, truncating.
#[inline]
pub fn ticks_to_ms(ticks: u64, hz: u32) -> u64 {
    ticks.saturating_mul(MILLIS_PER_SEC) / u64::from(hz.max(1))
}

/// Ticks needed to cover `ms` at `hz`, truncating.
#[inline]
pub fn ms_to_ticks(ms: u64, hz: u32) -> u64 {
    ms.saturating_mul(u64::from(hz)) / MILLIS_PER_SEC
}

/// Midpoint of two timestamps without overflow.
#[inline]
pub fn midpoint_ms(a: u64, b: u64) -> u64 {
    a / 2 + b / 2 + (a % 2 + b % 2) / 2
}

/// Narrow a millisecond value to the 32-bit wire field, saturating.
#[inline]
pub fn wire_ms(ms: u64) -> u32 {
    u32::try_from(ms).unwrap_or(u32::MAX)
}
