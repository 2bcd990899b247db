use axle_core::command::{Command, CommandReader, FramedCommand, Inbound, apply_byte};
use axle_core::config::Thresholds;
use axle_core::frame::frame_to_vec;
use axle_core::message::{ConfigParam, OutgoingMessage};
use rstest::rstest;

fn ok(command: u8) -> OutgoingMessage {
    OutgoingMessage::SetupOk { command }
}

fn err(command: u8) -> OutgoingMessage {
    OutgoingMessage::SetupError { command }
}

#[test]
fn threshold_must_stay_below_half_window() {
    let mut t = Thresholds {
        window_length: 4,
        threshold_on: 0,
        ..Thresholds::default()
    };
    assert_eq!(apply_byte(30, &mut t), err(30));
    assert_eq!(t.threshold_on, 0);
    assert_eq!(apply_byte(21, &mut t), ok(21));
    assert_eq!(t.threshold_on, 1);
}

#[rstest]
#[case(0xF5, OutgoingMessage::Echo { byte: 0xF5 })]
#[case(1, OutgoingMessage::Report { param: ConfigParam::WindowLength, value: 4 })]
#[case(4, OutgoingMessage::Report { param: ConfigParam::ErrorSeconds, value: 2 })]
#[case(61, ok(61))]
#[case(64, ok(64))]
#[case(65, err(65))]
#[case(60, err(60))]
#[case(40, ok(40))]
#[case(15, ok(15))]
#[case(16, err(16))]
#[case(10, err(10))]
#[case(0, err(0))]
#[case(5, err(5))]
fn single_byte_replies(#[case] byte: u8, #[case] expected: OutgoingMessage) {
    let mut t = Thresholds::default();
    assert_eq!(apply_byte(byte, &mut t), expected);
}

#[rstest]
#[case(11, 2)]
#[case(13, 8)]
#[case(15, 32)]
fn window_exponent(#[case] byte: u8, #[case] window: u8) {
    let mut t = Thresholds::default();
    apply_byte(byte, &mut t);
    assert_eq!(t.window_length, window);
}

#[test]
fn error_seconds_and_threshold_off_are_stored() {
    let mut t = Thresholds::default();
    apply_byte(63, &mut t);
    apply_byte(40, &mut t);
    assert_eq!(t.error_seconds, 3);
    assert_eq!(t.threshold_off, 0);
    assert_eq!(
        apply_byte(3, &mut t),
        OutgoingMessage::Report {
            param: ConfigParam::ThresholdOff,
            value: 0
        }
    );
}

#[test]
fn parse_checks_ranges_top_down() {
    assert_eq!(Command::parse(0xEF), Command::SetErrorSeconds(0xEF - 60));
    assert_eq!(Command::parse(60), Command::SetThresholdOff(20));
    assert_eq!(Command::parse(39), Command::SetThresholdOn(19));
    assert_eq!(Command::parse(19), Command::SetWindow(9));
    assert_eq!(Command::parse(2), Command::Get(ConfigParam::ThresholdOn));
    assert_eq!(Command::parse(7), Command::Unknown(7));
}

#[test]
fn framed_command_needs_our_address_and_header() {
    assert_eq!(
        FramedCommand::parse(&[0x01, 16, 1, 7]),
        Some(FramedCommand { command: 1, id: 7 })
    );
    assert_eq!(
        FramedCommand::parse(&[0x01, 16, 0, 3, 0xAA]),
        Some(FramedCommand { command: 0, id: 3 })
    );
    assert_eq!(FramedCommand::parse(&[0x02, 16, 1, 7]), None);
    assert_eq!(FramedCommand::parse(&[0x01, 17, 1, 7]), None);
    assert_eq!(FramedCommand::parse(&[0x01, 16, 1]), None);
}

#[test]
fn reader_separates_bytes_from_frames() {
    let mut reader = CommandReader::new();
    let mut stream = vec![2u8];
    stream.extend(frame_to_vec(&[0x01, 16, 1, 9]));
    stream.push(0xF1);

    let inbound: Vec<Inbound> = stream.iter().flat_map(|&b| reader.push(b)).collect();
    assert_eq!(inbound.len(), 3);
    assert!(matches!(inbound[0], Inbound::Byte(2)));
    match inbound[1] {
        Inbound::Framed(f) => assert_eq!(f.as_slice(), &[0x01, 16, 1, 9]),
        other => panic!("expected frame, got {other:?}"),
    }
    assert!(matches!(inbound[2], Inbound::Byte(0xF1)));
}

#[test]
fn reset_forgets_partial_frame() {
    let mut reader = CommandReader::new();
    assert_eq!(reader.push(0x7C).count(), 0);
    assert_eq!(reader.push(0x01).count(), 0);
    assert!(reader.is_pending());
    reader.reset();
    assert!(!reader.is_pending());
    let inbound: Vec<Inbound> = reader.push(3).collect();
    assert!(matches!(inbound[..], [Inbound::Byte(3)]));
}

#[test]
fn frame_start_needs_our_address_next() {
    let mut reader = CommandReader::new();
    assert_eq!(reader.push(0x7C).count(), 0);
    let inbound: Vec<Inbound> = reader.push(0xF5).collect();
    assert!(matches!(
        inbound[..],
        [Inbound::Byte(0x7C), Inbound::Byte(0xF5)]
    ));
    assert!(!reader.is_pending());

    // Two starts in a row: the first is a byte, the second may still open a frame
    assert_eq!(reader.push(0x7C).count(), 0);
    let inbound: Vec<Inbound> = reader.push(0x7C).collect();
    assert!(matches!(inbound[..], [Inbound::Byte(0x7C)]));
    assert!(reader.is_pending());
}

#[test]
fn shrinking_window_clamps_thresholds() {
    let mut t = Thresholds {
        window_length: 32,
        threshold_on: 15,
        threshold_off: 15,
        ..Thresholds::default()
    };
    assert_eq!(apply_byte(11, &mut t), ok(11));
    assert_eq!(t.window_length, 2);
    assert_eq!((t.threshold_on, t.threshold_off), (0, 0));

    // Growing the window leaves them alone
    t.threshold_on = 0;
    apply_byte(13, &mut t);
    apply_byte(22, &mut t);
    apply_byte(14, &mut t);
    assert_eq!((t.window_length, t.threshold_on), (16, 2));
}
