//! A deferred-header HTTP response writer
//!
//! This crate provides the response writer a request pipeline hands to its
//! handlers and middlewares. It sits between the pipeline and the transport-level
//! response sink and:
//!
//! - holds back the status line and headers until the first body byte is written
//!   or emission is forced, so the status may change until output starts
//! - tracks the status and the number of body bytes written, so middlewares and
//!   access logs can observe the response without access to the transport
//! - re-exposes the optional capabilities of the sink (connection hijacking,
//!   flush, server push, close notification) behind one uniform surface
//!
//! # Example
//!
//! ```
//! use http::StatusCode;
//! use micro_writer::connection::StreamSink;
//! use micro_writer::writer::ResponseWriter;
//! use std::io::Cursor;
//!
//! let mut writer = ResponseWriter::new(StreamSink::new(Cursor::new(Vec::new())));
//!
//! // nothing is sent yet, so the handler may still change its mind
//! writer.set_status(500);
//! writer.set_status(404);
//! assert!(!writer.is_written());
//!
//! writer.write_str("no such page").unwrap();
//! assert_eq!(writer.status(), StatusCode::NOT_FOUND);
//! assert_eq!(writer.size(), Some(12));
//!
//! // the connection driver completes the response on the transport
//! writer.sink_mut().finish().unwrap();
//!
//! // and reuses the writer for the next request
//! let previous = writer.reset(StreamSink::new(Cursor::new(Vec::new())));
//! assert!(previous.into_inner().unwrap().into_inner().starts_with(b"HTTP/1.1 404 Not Found\r\n"));
//! assert_eq!(writer.size(), None);
//! ```
//!
//! # Architecture
//!
//! - [`writer`]: the [`ResponseWriter`](writer::ResponseWriter) decorator
//! - [`sink`]: the [`ResponseSink`](sink::ResponseSink) contract and the optional
//!   capability traits a sink may provide
//! - [`connection`]: [`StreamSink`](connection::StreamSink), an HTTP/1.1 sink over a
//!   byte stream
//! - [`codec`]: response head and body encoders used by the stream sink
//! - [`protocol`]: shared types and errors
//!
//! # Capabilities
//!
//! `hijack`, `flush` and `close_notify` fail with
//! [`WriterError::Unsupported`](protocol::WriterError::Unsupported) when the sink does not
//! provide them. `pusher` never fails, it returns `None` instead.
//!
//! # Concurrency
//!
//! A writer serves one request at a time and is driven through `&mut self`, it
//! adds no locking and no suspension point of its own.

pub mod codec;
pub mod connection;
pub mod protocol;
pub mod sink;
pub mod writer;

mod utils;
pub(crate) use utils::ensure;
