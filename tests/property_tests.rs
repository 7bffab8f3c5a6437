//! Property-based tests using proptest
//!
//! These tests check the framing invariants across randomly generated
//! lengths and payloads.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::BytesMut;
use framed_listener::core::frame::{self, HEADER_LEN};
use framed_listener::{FrameCodec, ListenerError};
use proptest::prelude::*;
use tokio::io::AsyncWriteExt;
use tokio_util::codec::{Decoder, Encoder};

const MAX: usize = 64 * 1024;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// Property: a valid frame yields exactly declared - 4 payload bytes and
// consumes exactly `declared` bytes from the stream
proptest! {
    #[test]
    fn prop_read_frame_consumes_exactly_declared(
        payload in prop::collection::vec(any::<u8>(), 0..4096),
        trailer in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let rt = runtime();
        let (read, rest) = rt.block_on(async {
            let (mut client, mut server) = tokio::io::duplex(16 * 1024);
            client.write_all(&frame::encode_header(payload.len()).unwrap()).await.unwrap();
            client.write_all(&payload).await.unwrap();
            client.write_all(&trailer).await.unwrap();
            drop(client);

            let read = frame::read_frame(&mut server, MAX).await.unwrap();
            let mut rest = Vec::new();
            tokio::io::AsyncReadExt::read_to_end(&mut server, &mut rest).await.unwrap();
            (read, rest)
        });

        prop_assert_eq!(&read[..], &payload[..]);
        prop_assert_eq!(rest, trailer);
    }
}

// Property: lengths outside [4, max] are rejected before any payload is read
proptest! {
    #[test]
    fn prop_out_of_range_lengths_rejected(declared in prop_oneof![0u32..4, (MAX as u32 + 1)..u32::MAX]) {
        let result = frame::validate_length(declared as usize, MAX);
        prop_assert!(result.is_err());
        prop_assert!(!frame::is_valid(declared as usize, MAX));

        let rt = runtime();
        let err = rt.block_on(async {
            let (mut client, mut server) = tokio::io::duplex(64);
            client.write_all(&declared.to_le_bytes()).await.unwrap();
            frame::read_frame(&mut server, MAX).await.unwrap_err()
        });
        prop_assert!(err.is_protocol_violation());
    }
}

// Property: in-range lengths validate to declared - 4
proptest! {
    #[test]
    fn prop_in_range_lengths_accepted(declared in (HEADER_LEN)..=MAX) {
        prop_assert!(frame::is_valid(declared, MAX));
        prop_assert_eq!(frame::validate_length(declared, MAX).unwrap(), declared - HEADER_LEN);
    }
}

// Property: the codec yields the same frames however the input is split
proptest! {
    #[test]
    fn prop_codec_is_split_invariant(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..512), 1..8),
        chunk in 1usize..64,
    ) {
        let mut codec = FrameCodec::new(MAX);
        let mut wire = BytesMut::new();
        for p in &payloads {
            codec.encode(&p[..], &mut wire).unwrap();
        }

        let mut decoded = Vec::new();
        let mut buf = BytesMut::new();
        for piece in wire.chunks(chunk) {
            buf.extend_from_slice(piece);
            while let Some(frame) = codec.decode(&mut buf).unwrap() {
                decoded.push(frame.to_vec());
            }
        }

        prop_assert!(buf.is_empty());
        prop_assert_eq!(decoded, payloads);
    }
}

// Property: header decoding never panics on arbitrary input
proptest! {
    #[test]
    fn prop_decode_header_total(bytes in prop::collection::vec(any::<u8>(), 0..8)) {
        match frame::decode_header(&bytes) {
            Ok(n) => {
                prop_assert!(bytes.len() >= HEADER_LEN);
                prop_assert_eq!(n as u32, u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
            }
            Err(ListenerError::Io(_)) => prop_assert!(bytes.len() < HEADER_LEN),
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }
}
