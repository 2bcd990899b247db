#![no_main]
use axle_core::OutgoingMessage;
use axle_core::frame::{Deframer, FRAME_CAPACITY, frame_to_vec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut d = Deframer::new();
    for &b in data {
        if let Some(frame) = d.push(b) {
            assert!(frame.len() <= FRAME_CAPACITY);
            // Anything that decodes must encode to the same payload
            if let Ok(msg) = OutgoingMessage::decode(&frame) {
                let (payload, n) = msg.to_payload();
                assert_eq!(&payload[..n], frame.as_slice());
            }
        }
    }

    // Framing is transparent for any payload that fits
    let payload = &data[..data.len().min(FRAME_CAPACITY)];
    let mut d = Deframer::new();
    let frames: Vec<_> = frame_to_vec(payload)
        .into_iter()
        .filter_map(|b| d.push(b))
        .collect();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].as_slice(), payload);
});
