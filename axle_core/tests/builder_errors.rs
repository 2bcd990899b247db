use axle_core::config::{
    DebounceCfg, FrontEndKind, ReportMode, SessionCfg, Thresholds, TimingCfg,
};
use axle_core::error::BuildError;
use axle_core::{Controller, SessionState};
use axle_hardware::LoopbackSerial;
use rstest::rstest;

#[rstest]
fn builder_missing_port_yields_typed_build_error() {
    let err = Controller::<LoopbackSerial>::builder()
        // missing with_port()
        .with_thresholds(Thresholds::default())
        .try_build()
        .expect_err("should fail with MissingPort");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingPort) => {}
        other => panic!("expected MissingPort, got: {other:?}"),
    }
}

fn thresholds(window_length: u8, threshold_on: u8, threshold_off: u8, error_seconds: u8) -> Thresholds {
    Thresholds {
        window_length,
        threshold_on,
        threshold_off,
        error_seconds,
    }
}

#[rstest]
#[case::empty_window(thresholds(0, 0, 0, 2), "window_length")]
#[case::window_too_long(thresholds(64, 1, 1, 2), "window_length")]
#[case::on_at_half(thresholds(4, 2, 1, 2), "window_length/2")]
#[case::off_at_half(thresholds(8, 1, 4, 2), "window_length/2")]
#[case::window_of_one(thresholds(1, 0, 1, 2), "window_length/2")]
#[case::no_error_limit(thresholds(4, 1, 1, 0), "error_seconds")]
fn invalid_thresholds_are_rejected(#[case] t: Thresholds, #[case] needle: &str) {
    let err = Controller::builder()
        .with_port(LoopbackSerial::new())
        .with_thresholds(t)
        .build()
        .expect_err("should reject thresholds");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(msg)) => assert!(msg.contains(needle), "{msg}"),
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}

#[test]
fn zero_timings_are_rejected() {
    let cases: Vec<(TimingCfg, DebounceCfg, SessionCfg)> = vec![
        (
            TimingCfg { tick_hz: 0, poll_us: 500 },
            DebounceCfg::default(),
            SessionCfg::default(),
        ),
        (
            TimingCfg { tick_hz: 1000, poll_us: 0 },
            DebounceCfg::default(),
            SessionCfg::default(),
        ),
        (
            TimingCfg::default(),
            DebounceCfg { on_delay_ms: 0, ..DebounceCfg::default() },
            SessionCfg::default(),
        ),
        (
            TimingCfg::default(),
            DebounceCfg::default(),
            SessionCfg { stop_timeout_ms: 0, ..SessionCfg::default() },
        ),
    ];
    for (timing, debounce, session) in cases {
        let res = Controller::builder()
            .with_port(LoopbackSerial::new())
            .with_timing(timing)
            .with_debounce(debounce)
            .with_session(session)
            .build();
        assert!(
            matches!(
                res.as_ref().map_err(|e| e.downcast_ref::<BuildError>()),
                Err(Some(BuildError::InvalidConfig(_)))
            ),
            "expected InvalidConfig for {timing:?} {debounce:?} {session:?}"
        );
    }
}

#[test]
fn axle_reports_need_the_moving_sum() {
    let err = Controller::builder()
        .with_port(LoopbackSerial::new())
        .with_session(SessionCfg {
            front_end: FrontEndKind::Debounce,
            report: ReportMode::Axle,
            ..SessionCfg::default()
        })
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("moving-sum"));
}

#[test]
fn builds_from_a_config_file() {
    let cfg = axle_config::load_toml(
        r#"
        [timing]
        tick_hz = 1000

        [thresholds]
        window_length = 8
        threshold_on = 3

        [session]
        front_end = "debounce"
        "#,
    )
    .unwrap();
    cfg.validate().unwrap();
    let c = Controller::builder()
        .with_port(LoopbackSerial::new())
        .apply_config(&cfg)
        .build()
        .unwrap();
    assert_eq!(c.tick_hz(), 1000);
    assert_eq!(c.thresholds(), thresholds(8, 3, 1, 2));
    assert_eq!(c.session_state(), SessionState::Sleep);
}
