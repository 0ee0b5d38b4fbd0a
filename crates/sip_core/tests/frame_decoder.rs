use pretty_assertions::assert_eq;
use sip_core::{frame_payload, FrameDecoder};

#[test]
fn only_data_lines_yield_payloads() {
    let mut decoder = FrameDecoder::new();

    let payloads = decoder.feed(b"event: ping\ndata: first\n\ndata:    \n: comment\ndata:  second  \n");

    assert_eq!(payloads, vec!["first".to_string(), "second".to_string()]);
}

#[test]
fn split_utf8_sequence_is_completed_by_next_chunk() {
    let mut decoder = FrameDecoder::new();
    let line = "data: Target ₹50,00,000\n".as_bytes();
    let split = line.iter().position(|byte| *byte == 0xE2).expect("rupee sign") + 1;

    let first = decoder.feed(&line[..split]);
    let second = decoder.feed(&line[split..]);

    // Without line carry the head of the split line is emitted on its own.
    assert_eq!(first, vec!["Target".to_string()]);
    assert_eq!(second, Vec::<String>::new());
}

#[test]
fn line_carry_reassembles_split_frames() {
    let mut decoder = FrameDecoder::with_line_carry(true);

    let first = decoder.feed(b"data: {\"type\":\"connec");
    let second = decoder.feed("tion_established\"}\ndata: Target ₹".as_bytes());
    let rest = decoder.finish();

    assert_eq!(first, Vec::<String>::new());
    assert_eq!(
        second,
        vec![r#"{"type":"connection_established"}"#.to_string()]
    );
    assert_eq!(rest, vec!["Target ₹".to_string()]);
}

#[test]
fn carry_keeps_multibyte_characters_across_chunks() {
    let mut decoder = FrameDecoder::with_line_carry(true);
    let bytes = "data: ₹ planned\n".as_bytes();

    let mut payloads = Vec::new();
    for byte in bytes {
        payloads.extend(decoder.feed(std::slice::from_ref(byte)));
    }

    assert_eq!(payloads, vec!["₹ planned".to_string()]);
}

#[test]
fn frame_payload_requires_marker_and_content() {
    assert_eq!(frame_payload("data: x"), Some("x".to_string()));
    assert_eq!(frame_payload("data:x"), None);
    assert_eq!(frame_payload("data:  "), None);
    assert_eq!(frame_payload("id: 4"), None);
}
