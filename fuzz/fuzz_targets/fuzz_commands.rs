#![no_main]
use axle_core::command::apply_byte;
use axle_core::config::Thresholds;
use axle_core::moving_sum::MAX_WINDOW;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any command sequence keeps the thresholds in their valid ranges
    let mut t = Thresholds::default();
    for &b in data {
        let _ = apply_byte(b, &mut t);
        assert!(t.window_length >= 1 && usize::from(t.window_length) <= MAX_WINDOW);
        assert!(t.error_seconds <= 4);
        assert!(t.threshold_on < t.half_window().max(1));
        assert!(t.threshold_off < t.half_window().max(1));
    }
});
