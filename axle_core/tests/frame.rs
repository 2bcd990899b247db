use axle_core::frame::{
    Deframer, FRAME_ESC, FRAME_START, FRAME_STOP, MAX_FRAME, decode_stream, encode_frame,
    frame_to_vec,
};
use axle_core::message::{MAX_MESSAGE, OutgoingMessage};
use proptest::prelude::*;

#[test]
fn passby_stop_with_control_bytes_survives_framing() {
    // Pass-by number and stop time both carry control bytes
    let msg = OutgoingMessage::PassbyStop {
        passby: 0x7E,
        axles: 2,
        stop_time_ms: 0x7D7C,
    };
    let (payload, n) = msg.to_payload();
    let wire = frame_to_vec(&payload[..n]);
    assert_eq!(wire.first(), Some(&FRAME_START));
    assert_eq!(wire.last(), Some(&FRAME_STOP));
    assert_eq!(wire.len(), n + 2 + 3);

    let frames = decode_stream(&wire);
    assert_eq!(frames.len(), 1);
    assert_eq!(OutgoingMessage::decode(&frames[0]).unwrap(), msg);
}

#[test]
fn worst_case_message_fits_max_frame() {
    let payload = [FRAME_ESC; MAX_MESSAGE];
    let mut out = [0u8; MAX_FRAME];
    assert_eq!(encode_frame(&payload, &mut out).unwrap(), MAX_FRAME);
}

#[test]
fn garbage_between_frames_is_skipped() {
    let mut stream = vec![0x00, 0x55, FRAME_STOP, FRAME_ESC];
    stream.extend(frame_to_vec(&[1, 2]));
    stream.extend([0xAA, 0xBB]);
    stream.extend(frame_to_vec(&[3]));
    let frames = decode_stream(&stream);
    let payloads: Vec<&[u8]> = frames.iter().map(|f| f.as_slice()).collect();
    assert_eq!(payloads, vec![&[1u8, 2][..], &[3u8][..]]);
}

#[test]
fn empty_frame_is_delivered() {
    let frames = decode_stream(&[FRAME_START, FRAME_STOP]);
    assert_eq!(frames.len(), 1);
    assert!(frames[0].is_empty());
}

#[test]
fn deframer_reports_frame_state() {
    let mut d = Deframer::new();
    assert!(!d.in_frame());
    assert!(d.push(FRAME_START).is_none());
    assert!(d.in_frame());
    assert!(d.push(FRAME_ESC).is_none());
    assert!(d.push(FRAME_STOP).is_none());
    let frame = d.push(FRAME_STOP).unwrap();
    assert_eq!(frame.as_slice(), &[FRAME_STOP]);
    assert!(!d.in_frame());
}

proptest! {
    #[test]
    fn any_payload_round_trips(payload in prop::collection::vec(any::<u8>(), 0..=32)) {
        let wire = frame_to_vec(&payload);
        // Only the delimiters are unescaped control bytes
        let unescaped_start = wire
            .iter()
            .enumerate()
            .filter(|&(i, &b)| b == FRAME_START && (i == 0 || wire[i - 1] != FRAME_ESC))
            .count();
        prop_assert_eq!(unescaped_start, 1);
        let frames = decode_stream(&wire);
        prop_assert_eq!(frames.len(), 1);
        prop_assert_eq!(frames[0].as_slice(), payload.as_slice());
    }
}
