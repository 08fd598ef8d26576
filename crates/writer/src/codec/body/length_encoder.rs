use crate::ensure;
use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::Encoder;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthEncoder {
    declared: u64,
    length: u64,
}

impl LengthEncoder {
    pub fn new(length: u64) -> Self {
        Self { declared: length, length }
    }

    pub fn is_finish(&self) -> bool {
        self.length == 0
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for LengthEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            PayloadItem::Chunk(bytes) => {
                if !bytes.has_remaining() {
                    return Ok(());
                }

                let size = bytes.remaining() as u64;
                ensure!(size <= self.length, SendError::content_length_exceeded(self.declared));

                dst.put(bytes);
                self.length -= size;
                Ok(())
            }
            PayloadItem::Eof => {
                if self.length > 0 {
                    warn!(declared = self.declared, missing = self.length, "body shorter than the declared content-length");
                    return Err(SendError::invalid_body(format!(
                        "declared content-length {} but {} bytes were not written",
                        self.declared, self.length
                    )));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn encode_exact_length() {
        let mut encoder = LengthEncoder::new(5);
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(&b"he"[..]), &mut dst).unwrap();
        encoder.encode(PayloadItem::Chunk(&b"llo"[..]), &mut dst).unwrap();
        encoder.encode(PayloadItem::<&[u8]>::Eof, &mut dst).unwrap();

        assert_eq!(&dst[..], b"hello");
        assert!(encoder.is_finish());
    }

    #[test]
    fn reject_more_than_declared() {
        let mut encoder = LengthEncoder::new(2);
        let mut dst = BytesMut::new();

        let result = encoder.encode(PayloadItem::Chunk(&b"abc"[..]), &mut dst);

        assert!(matches!(result, Err(SendError::ContentLengthExceeded { declared: 2 })));
        assert!(dst.is_empty());
    }

    #[test]
    fn reject_short_body_at_eof() {
        let mut encoder = LengthEncoder::new(4);
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(&b"ab"[..]), &mut dst).unwrap();
        let result = encoder.encode(PayloadItem::<&[u8]>::Eof, &mut dst);

        assert!(matches!(result, Err(SendError::InvalidBody { .. })));
    }

    #[test]
    fn encode_every_segment_of_chained_buf() {
        let mut encoder = LengthEncoder::new(6);
        let mut dst = BytesMut::new();

        let body = Bytes::from_static(b"abc").chain(Bytes::from_static(b"def"));
        encoder.encode(PayloadItem::Chunk(body), &mut dst).unwrap();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();

        assert_eq!(&dst[..], b"abcdef");
        assert!(encoder.is_finish());
    }
}
