//! HTTP codec module for encoding responses onto the wire
//!
//! The stream sink owns every protocol-level concern of a response; this module
//! provides the pieces it is assembled from:
//!
//! - [`HeaderEncoder`]: serializes the status line and headers, keeping the
//!   framing headers consistent with the chosen payload size
//! - [`PayloadEncoder`]: frames body chunks with content-length or chunked
//!   transfer encoding, or rejects a body where the status forbids one
//!
//! Both implement `tokio_util::codec::Encoder` and write into a `BytesMut`.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use http::{Response, StatusCode};
//! use micro_writer::codec::{HeaderEncoder, PayloadEncoder};
//! use micro_writer::protocol::{PayloadItem, PayloadSize};
//! use tokio_util::codec::Encoder;
//!
//! let mut dst = BytesMut::new();
//! let head = Response::builder().status(StatusCode::OK).body(()).unwrap();
//! HeaderEncoder.encode((head, PayloadSize::Chunked), &mut dst).unwrap();
//!
//! let mut body = PayloadEncoder::from(PayloadSize::Chunked);
//! body.encode(PayloadItem::Chunk(&b"hi"[..]), &mut dst).unwrap();
//! body.encode(PayloadItem::<&[u8]>::Eof, &mut dst).unwrap();
//! assert!(dst.ends_with(b"2\r\nhi\r\n0\r\n\r\n"));
//! ```

mod body;
mod header;

pub use body::PayloadEncoder;
pub use header::HeaderEncoder;
