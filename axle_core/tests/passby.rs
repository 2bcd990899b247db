//! End-to-end pass-by scenarios replayed at 1 kHz, checked on the wire.

use axle_config::TraceTick;
use axle_core::config::{FrontEndKind, ReportMode, SessionCfg, TimingCfg};
use axle_core::frame::decode_stream;
use axle_core::runner::replay;
use axle_core::{Controller, OutgoingMessage, SessionState};
use axle_hardware::LoopbackSerial;
use rstest::rstest;

/// Build a trace from `(rows, cell, arm)` segments.
fn trace(segments: &[(usize, u8, u8)]) -> Vec<TraceTick> {
    segments
        .iter()
        .flat_map(|&(n, cell, arm)| {
            std::iter::repeat_n(
                TraceTick {
                    blocked: cell == 1,
                    arm: arm == 1,
                },
                n,
            )
        })
        .collect()
}

/// Two wheels: blocked rows 11..=30 and 61..=80.
fn two_axles(tail: &[(usize, u8, u8)]) -> Vec<TraceTick> {
    let mut segs = vec![(10, 0, 1), (20, 1, 1), (30, 0, 1), (20, 1, 1), (30, 0, 1)];
    segs.extend_from_slice(tail);
    trace(&segs)
}

fn controller(front_end: FrontEndKind, report: ReportMode) -> (Controller<LoopbackSerial>, LoopbackSerial) {
    let port = LoopbackSerial::new();
    let c = Controller::builder()
        .with_port(port.clone())
        .with_timing(TimingCfg {
            tick_hz: 1000,
            poll_us: 500,
        })
        .with_session(SessionCfg {
            front_end,
            report,
            ..SessionCfg::default()
        })
        .build()
        .unwrap();
    (c, port)
}

fn run(
    c: &mut Controller<LoopbackSerial>,
    rows: &[TraceTick],
) -> (Vec<(u64, OutgoingMessage)>, axle_core::RunSummary) {
    let mut seen = Vec::new();
    let summary = replay(c, rows, |tick, msg| seen.push((tick, *msg))).unwrap();
    (seen, summary)
}

fn wire(port: &LoopbackSerial) -> Vec<OutgoingMessage> {
    decode_stream(&port.sent())
        .iter()
        .map(|f| OutgoingMessage::decode(f).unwrap())
        .collect()
}

#[test]
fn disarm_closes_the_passby() {
    let (mut c, port) = controller(FrontEndKind::MovingSum, ReportMode::Passby);
    let (seen, summary) = run(&mut c, &two_axles(&[(5, 0, 0)]));

    assert_eq!(
        seen,
        vec![
            (34, OutgoingMessage::PassbyStart { passby: 1, timestamp_ms: 14 }),
            (84, OutgoingMessage::PassbyAxle { passby: 1, axle: 2, time_ms: 60 }),
            (111, OutgoingMessage::PassbyStop { passby: 1, axles: 2, stop_time_ms: 97 }),
        ]
    );
    let sent: Vec<OutgoingMessage> = seen.iter().map(|(_, m)| *m).collect();
    assert_eq!(wire(&port), sent);
    assert_eq!(summary.ticks, 115);
    assert_eq!(summary.messages, 3);
    assert_eq!(summary.final_state, SessionState::Idle);
    assert_eq!(summary.counters.passbys, 1);
    assert_eq!(summary.counters.axles, 0);
}

#[rstest]
#[case::moving_sum(FrontEndKind::MovingSum, 14, 3070)]
#[case::debounce(FrontEndKind::Debounce, 11, 3073)]
fn stop_timeout_closes_the_passby(
    #[case] front_end: FrontEndKind,
    #[case] origin: u32,
    #[case] stop_time_ms: u32,
) {
    let (mut c, port) = controller(front_end, ReportMode::Passby);
    let (seen, summary) = run(&mut c, &two_axles(&[(3100, 0, 1)]));

    assert_eq!(
        seen,
        vec![
            (34, OutgoingMessage::PassbyStart { passby: 1, timestamp_ms: origin }),
            (84, OutgoingMessage::PassbyAxle { passby: 1, axle: 2, time_ms: 60 }),
            (3084, OutgoingMessage::PassbyStop { passby: 1, axles: 2, stop_time_ms }),
        ]
    );
    assert_eq!(wire(&port).len(), 3);
    assert_eq!(summary.final_state, SessionState::Ready);
    assert!(!c.snapshot().stop_flag, "stop flag acknowledged");
}

#[test]
fn second_passby_counts_up() {
    let (mut c, _port) = controller(FrontEndKind::MovingSum, ReportMode::Passby);
    let rows = trace(&[
        (10, 0, 1),
        (20, 1, 1),
        (30, 0, 1),
        (3, 0, 0),
        (2, 0, 1),
        (20, 1, 1),
        (30, 0, 1),
        (3, 0, 0),
    ]);
    let (seen, summary) = run(&mut c, &rows);
    let passbys: Vec<u16> = seen
        .iter()
        .filter_map(|(_, m)| match m {
            OutgoingMessage::PassbyStart { passby, .. } => Some(*passby),
            _ => None,
        })
        .collect();
    assert_eq!(passbys, vec![1, 2]);
    assert_eq!(summary.counters.passbys, 2);
    assert_eq!(summary.final_state, SessionState::Idle);
}

#[test]
fn stuck_wheel_reports_error_then_recovers() {
    let (mut c, port) = controller(FrontEndKind::MovingSum, ReportMode::Passby);
    let rows = trace(&[(10, 0, 1), (2090, 1, 1), (20, 0, 1)]);
    let (seen, summary) = run(&mut c, &rows);

    assert_eq!(seen, vec![(2015, OutgoingMessage::PassbyError { errors: 1 })]);
    assert_eq!(wire(&port), vec![OutgoingMessage::PassbyError { errors: 1 }]);
    assert_eq!(summary.final_state, SessionState::Ready);
    assert_eq!(summary.counters.errors, 1);
    assert_eq!(summary.counters.passbys, 0);
}

#[test]
fn disarm_during_error_returns_to_idle() {
    let (mut c, _port) = controller(FrontEndKind::MovingSum, ReportMode::Passby);
    let rows = trace(&[(10, 0, 1), (2010, 1, 1), (5, 1, 0)]);
    let (seen, summary) = run(&mut c, &rows);
    assert_eq!(seen.len(), 1);
    assert_eq!(summary.final_state, SessionState::Idle);
}

#[test]
fn axle_mode_forwards_wheel_reports() {
    let (mut c, port) = controller(FrontEndKind::MovingSum, ReportMode::Axle);
    let (seen, summary) = run(&mut c, &trace(&[(10, 0, 1), (20, 1, 1), (10, 0, 1)]));

    // Eight OFF ticks after arming plus four while the sum fills
    assert_eq!(seen, vec![(34, OutgoingMessage::Axle { on: 5, off: 3 })]);
    assert_eq!(wire(&port), vec![OutgoingMessage::Axle { on: 5, off: 3 }]);
    assert_eq!(summary.final_state, SessionState::Ready);
    assert_eq!(summary.counters.passbys, 0);
}

#[test]
fn nothing_happens_while_disarmed() {
    let (mut c, port) = controller(FrontEndKind::MovingSum, ReportMode::Passby);
    let (seen, summary) = run(&mut c, &trace(&[(10, 0, 0), (20, 1, 0), (10, 0, 0)]));
    assert!(seen.is_empty());
    assert!(port.sent().is_empty());
    assert_eq!(summary.final_state, SessionState::Idle);
    assert_eq!(summary.ticks, 40);
}
