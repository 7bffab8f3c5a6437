#![no_main]

use bytes::BytesMut;
use framed_listener::core::frame;
use framed_listener::FrameCodec;
use libfuzzer_sys::fuzz_target;
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    // Header validation and incremental decoding must never panic
    if let Ok(declared) = frame::decode_header(data) {
        let _ = frame::validate_length(declared, 64 * 1024);
    }

    let mut codec = FrameCodec::new(64 * 1024);
    let mut buf = BytesMut::from(data);
    while let Ok(Some(_)) = codec.decode(&mut buf) {}
});
