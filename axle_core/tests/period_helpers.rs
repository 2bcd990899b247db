// Focused tests for tick/time helpers.
use axle_core::util::{midpoint_ms, ms_to_ticks, period_us, ticks_to_ms, wire_ms};

#[test]
fn period_us_clamps_and_floors() {
    // hz=1 → 1s
    assert_eq!(period_us(1), 1_000_000);
    // 2 kHz tick → 500µs
    assert_eq!(period_us(2000), 500);
    // Very high hz floors to 1µs minimum
    assert_eq!(period_us(u32::MAX), 1);
    // hz=0 is treated as 1
    assert_eq!(period_us(0), 1_000_000);
}

#[test]
fn ticks_and_ms_convert_by_tick_rate() {
    assert_eq!(ticks_to_ms(2000, 2000), 1000);
    assert_eq!(ticks_to_ms(3, 2000), 1);
    assert_eq!(ticks_to_ms(7, 1000), 7);
    assert_eq!(ms_to_ticks(1500, 2000), 3000);
    assert_eq!(ticks_to_ms(u64::MAX, 1000), u64::MAX / 1000);
}

#[test]
fn midpoint_does_not_overflow() {
    assert_eq!(midpoint_ms(64, 84), 74);
    assert_eq!(midpoint_ms(3, 4), 3);
    assert_eq!(midpoint_ms(3, 5), 4);
    assert_eq!(midpoint_ms(u64::MAX, u64::MAX), u64::MAX);
}

#[test]
fn wire_ms_saturates() {
    assert_eq!(wire_ms(97), 97);
    assert_eq!(wire_ms(u64::from(u32::MAX) + 1), u32::MAX);
}
