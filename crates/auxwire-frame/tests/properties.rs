use std::io::{Cursor, Read};

use auxwire_frame::{
    decode_to_vec, encode_frame, encode_to_vec, max_encoded_len, FrameError, FrameReader,
    TERMINATOR,
};
use bytes::BytesMut;
use proptest::prelude::*;

/// Delivers its bytes in a fixed, repeating pattern of chunk sizes.
struct ChunkedReader {
    inner: Cursor<Vec<u8>>,
    chunks: Vec<usize>,
    next: usize,
}

impl ChunkedReader {
    fn new(bytes: Vec<u8>, chunks: Vec<usize>) -> Self {
        Self {
            inner: Cursor::new(bytes),
            chunks,
            next: 0,
        }
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let size = self.chunks[self.next % self.chunks.len()].max(1);
        self.next += 1;
        let limit = size.min(buf.len());
        self.inner.read(&mut buf[..limit])
    }
}

fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        proptest::collection::vec(any::<u8>(), 0..1200),
        proptest::collection::vec(Just(0u8), 0..600),
        proptest::collection::vec(1u8..=255, 250..800),
    ]
}

#[test]
fn every_byte_value_round_trips() {
    let payload: Vec<u8> = (0..=255u8).cycle().take(2048).collect();
    let encoded = encode_to_vec(&payload);

    assert!(!encoded.contains(&TERMINATOR));
    assert_eq!(decode_to_vec(&encoded).unwrap(), payload);
}

#[test]
fn empty_payload_round_trips() {
    let encoded = encode_to_vec(&[]);
    assert_eq!(encoded, [0x01]);
    assert!(decode_to_vec(&encoded).unwrap().is_empty());
}

proptest! {
    #[test]
    fn prop_round_trip(payload in payload_strategy()) {
        let encoded = encode_to_vec(&payload);
        prop_assert_eq!(decode_to_vec(&encoded).unwrap(), payload);
    }

    #[test]
    fn prop_encoded_has_no_terminator(payload in payload_strategy()) {
        let encoded = encode_to_vec(&payload);
        prop_assert!(!encoded.contains(&TERMINATOR));
    }

    #[test]
    fn prop_accepted_bodies_are_canonical(
        payload in payload_strategy(),
        suffix in proptest::collection::vec(1u8..=255, 0..4),
    ) {
        let mut body = encode_to_vec(&payload);
        body.extend(&suffix);
        if let Ok(decoded) = decode_to_vec(&body) {
            prop_assert_eq!(encode_to_vec(&decoded), body);
        }
    }

    #[test]
    fn prop_overhead_bound(payload in payload_strategy()) {
        let n = payload.len();
        let encoded = encode_to_vec(&payload);
        prop_assert!(encoded.len() <= max_encoded_len(n));
        prop_assert!(encoded.len() <= n + n.div_ceil(254) + 1);
    }

    #[test]
    fn prop_reader_ignores_chunk_boundaries(
        p1 in payload_strategy(),
        p2 in payload_strategy(),
        chunks in proptest::collection::vec(1usize..64, 1..8),
    ) {
        let mut wire = BytesMut::new();
        encode_frame(&p1, &mut wire);
        encode_frame(&p2, &mut wire);

        let mut reader = FrameReader::new(ChunkedReader::new(wire.to_vec(), chunks));
        let got: Vec<Vec<u8>> = reader
            .frames()
            .map(|frame| frame.map(|bytes| bytes.to_vec()))
            .collect::<Result<_, _>>()
            .unwrap();

        prop_assert_eq!(got, vec![p1, p2]);
    }

    #[test]
    fn prop_missing_terminator_is_truncation(
        p1 in payload_strategy(),
        p2 in payload_strategy(),
        chunk in 1usize..32,
    ) {
        let mut wire = BytesMut::new();
        encode_frame(&p1, &mut wire);
        let expected_partial = encode_to_vec(&p2).len();
        wire.extend_from_slice(&encode_to_vec(&p2));

        let mut reader = FrameReader::new(ChunkedReader::new(wire.to_vec(), vec![chunk]));
        prop_assert_eq!(reader.read_payload().unwrap().unwrap().to_vec(), p1);

        let err = reader.read_payload().unwrap_err();
        prop_assert!(
            matches!(err, FrameError::Truncated { buffered } if buffered == expected_partial),
            "unexpected error: {err:?}"
        );
    }
}

#[test]
fn one_byte_per_read_yields_every_frame() {
    let payloads: Vec<Vec<u8>> = vec![b"first".to_vec(), vec![0; 3], Vec::new(), vec![0xFF; 300]];
    let mut wire = BytesMut::new();
    for payload in &payloads {
        encode_frame(payload, &mut wire);
    }

    let mut reader = FrameReader::new(ChunkedReader::new(wire.to_vec(), vec![1]));
    let got: Vec<Vec<u8>> = reader.frames().map(|f| f.unwrap().to_vec()).collect();
    assert_eq!(got, payloads);
}
