use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::core::frame::{self, DEFAULT_MAX_FRAME_SIZE, HEADER_LEN};
use crate::error::{ListenerError, Result};

/// Tokio codec for length-prefixed frames.
///
/// Decodes into payload `Bytes` (header stripped) and encodes payloads by
/// prepending the little-endian declared length. Both directions enforce the
/// same maximum frame size as the listener.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = ListenerError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let declared = frame::decode_header(&src[..HEADER_LEN])?;
        frame::validate_length(declared, self.max_frame_size)?;

        if src.len() < declared {
            src.reserve(declared - src.len());
            return Ok(None);
        }

        let mut buf = src.split_to(declared);
        buf.advance(HEADER_LEN);
        Ok(Some(buf.freeze()))
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = ListenerError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        Encoder::<&[u8]>::encode(self, item.as_ref(), dst)
    }
}

impl Encoder<&[u8]> for FrameCodec {
    type Error = ListenerError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<()> {
        let header = frame::encode_header(item.len())?;
        frame::validate_length(HEADER_LEN + item.len(), self.max_frame_size)?;

        dst.reserve(HEADER_LEN + item.len());
        dst.put_slice(&header);
        dst.put_slice(item);
        Ok(())
    }
}
