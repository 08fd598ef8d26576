use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Write;

use tokio_util::codec::Encoder;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedEncoder {
    eof: bool,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self { eof: false }
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }
}

impl Default for ChunkedEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            warn!("encode payload_item after the last chunk was sent");
            return Err(SendError::invalid_body("chunked body already finished"));
        }

        match item {
            PayloadItem::Chunk(bytes) => {
                let size = bytes.remaining();
                // a zero sized chunk would terminate the body
                if size == 0 {
                    return Ok(());
                }
                write!(helper::Writer(dst), "{size:X}\r\n")?;
                dst.reserve(size + 2);
                dst.put(bytes);
                dst.extend_from_slice(b"\r\n");
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.extend_from_slice(b"0\r\n\r\n");
                Ok(())
            }
        }
    }
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn encode_chunks_then_eof() {
        let mut encoder = ChunkedEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(&b"hello world, chunked"[..]), &mut dst).unwrap();
        encoder.encode(PayloadItem::Chunk(&b""[..]), &mut dst).unwrap();
        encoder.encode(PayloadItem::<&[u8]>::Eof, &mut dst).unwrap();

        assert_eq!(&dst[..], b"14\r\nhello world, chunked\r\n0\r\n\r\n");
        assert!(encoder.is_finish());
    }

    #[test]
    fn reject_chunk_after_eof() {
        let mut encoder = ChunkedEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::<&[u8]>::Eof, &mut dst).unwrap();
        let result = encoder.encode(PayloadItem::Chunk(&b"late"[..]), &mut dst);

        assert!(matches!(result, Err(SendError::InvalidBody { .. })));
        assert_eq!(&dst[..], b"0\r\n\r\n");
    }

    #[test]
    fn chunk_size_matches_chained_payload() {
        let mut encoder = ChunkedEncoder::new();
        let mut dst = BytesMut::new();

        let body = Bytes::from_static(b"abc").chain(Bytes::from_static(b"def"));
        encoder.encode(PayloadItem::Chunk(body), &mut dst).unwrap();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();

        assert_eq!(&dst[..], b"6\r\nabcdef\r\n0\r\n\r\n");
    }
}
