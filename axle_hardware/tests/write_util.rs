use std::time::Duration;

use axle_hardware::error::HwError;
use axle_hardware::util::write_all_with_timeout;

#[test]
fn write_all_survives_partial_writes() {
    let mut sink = Vec::new();
    let mut calls = 0u32;
    let res = write_all_with_timeout(
        |chunk| {
            calls += 1;
            // Accept at most two bytes per call, and nothing every third call
            if calls % 3 == 0 {
                return Ok(0);
            }
            let n = chunk.len().min(2);
            sink.extend_from_slice(&chunk[..n]);
            Ok(n)
        },
        &[0x7C, 1, 2, 3, 4, 0x7D],
        Duration::from_millis(50),
        Duration::from_micros(100),
    );
    assert!(res.is_ok(), "expected success, got {res:?}");
    assert_eq!(sink, vec![0x7C, 1, 2, 3, 4, 0x7D]);
}

#[test]
fn write_all_times_out_when_transmitter_stalls() {
    let err = write_all_with_timeout(
        |chunk| Ok(if chunk.len() > 3 { 1 } else { 0 }),
        &[1, 2, 3, 4, 5],
        Duration::from_millis(5),
        Duration::from_micros(200),
    )
    .expect_err("expected timeout error");

    match err {
        HwError::TransmitTimeout { sent, total } => {
            assert_eq!(sent, 2);
            assert_eq!(total, 5);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn write_errors_propagate() {
    let err = write_all_with_timeout(
        |_| Err(HwError::Uart("port closed".into())),
        &[1],
        Duration::from_millis(5),
        Duration::from_micros(200),
    )
    .expect_err("expected uart error");
    assert!(matches!(err, HwError::Uart(_)));
}
