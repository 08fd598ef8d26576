//! The contract between a [`ResponseWriter`](crate::writer::ResponseWriter) and the
//! transport-level sink it decorates.
//!
//! A sink must accept headers, a status and body bytes. Everything else is an
//! optional capability that the sink advertises through a query method on
//! [`ResponseSink`]; the defaults report the capability as absent, so a sink only
//! overrides the queries for what it actually supports:
//!
//! | capability | trait | query |
//! |------------|-------|-------|
//! | raw connection takeover | [`Hijacker`] | [`ResponseSink::hijacker`] |
//! | push buffered bytes out | [`Flusher`] | [`ResponseSink::flusher`] |
//! | HTTP/2 server push | [`Pusher`] | [`ResponseSink::pusher`] |
//! | client disconnect signal | [`CloseNotifier`] | [`ResponseSink::close_notifier`] |

use std::fmt;
use std::io;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use tokio::sync::oneshot;

use crate::protocol::WriterError;

/// The underlying target of a response: status, headers and body bytes.
pub trait ResponseSink {
    /// Header map that will be sent with the status line.
    ///
    /// Changes made after [`write_header`](ResponseSink::write_header) are not
    /// sent to the client.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Emits the status line and headers.
    fn write_header(&mut self, status: StatusCode);

    /// Writes body bytes, returning how many were accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Text write path, sinks with a cheaper route for `str` may override it.
    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        self.write(s.as_bytes())
    }

    fn hijacker(&mut self) -> Option<&mut dyn Hijacker> {
        None
    }

    fn flusher(&mut self) -> Option<&mut dyn Flusher> {
        None
    }

    fn pusher(&mut self) -> Option<&mut dyn Pusher> {
        None
    }

    fn close_notifier(&mut self) -> Option<&mut dyn CloseNotifier> {
        None
    }
}

/// A raw bidirectional connection handed out by [`Hijacker::hijack`].
pub trait Connection: io::Read + io::Write + Send {}

impl<T> Connection for T where T: io::Read + io::Write + Send + ?Sized {}

/// Result of a successful hijack.
///
/// Once hijacked the HTTP layer no longer touches the connection, the caller
/// owns it and must close it.
pub struct Hijacked {
    /// the raw connection
    pub conn: Box<dyn Connection>,
    /// bytes already read from the connection but not consumed by the server
    pub read_buf: Bytes,
}

impl Hijacked {
    pub fn new(conn: Box<dyn Connection>, read_buf: Bytes) -> Self {
        Self { conn, read_buf }
    }
}

impl fmt::Debug for Hijacked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hijacked").field("read_buf", &self.read_buf).finish_non_exhaustive()
    }
}

/// Lets a handler take over the underlying connection.
#[cfg_attr(test, mockall::automock)]
pub trait Hijacker {
    fn hijack(&mut self) -> Result<Hijacked, WriterError>;
}

/// Sends any buffered data to the client.
#[cfg_attr(test, mockall::automock)]
pub trait Flusher {
    fn flush(&mut self) -> io::Result<()>;
}

/// Options of a server push promise.
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    /// method of the promised request, `GET` when absent
    pub method: Option<Method>,
    /// additional headers of the promised request
    pub headers: HeaderMap,
}

/// Initiates HTTP/2 server pushes.
#[cfg_attr(test, mockall::automock)]
pub trait Pusher {
    /// Pushes `target`, an absolute path or absolute URL, to the client.
    fn push(&mut self, target: &str, options: &PushOptions) -> Result<(), WriterError>;
}

/// Reports when the client connection has gone away.
#[cfg_attr(test, mockall::automock)]
pub trait CloseNotifier {
    /// Returns a receiver that completes once the client connection is closed.
    ///
    /// The receiver may also fail with `RecvError` when the sink is dropped,
    /// which callers should treat the same way.
    fn close_notify(&mut self) -> oneshot::Receiver<()>;
}

impl<T: ResponseSink + ?Sized> ResponseSink for &mut T {
    #[inline]
    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    #[inline]
    fn write_header(&mut self, status: StatusCode) {
        (**self).write_header(status);
    }

    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    #[inline]
    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        (**self).write_str(s)
    }

    fn hijacker(&mut self) -> Option<&mut dyn Hijacker> {
        (**self).hijacker()
    }

    fn flusher(&mut self) -> Option<&mut dyn Flusher> {
        (**self).flusher()
    }

    fn pusher(&mut self) -> Option<&mut dyn Pusher> {
        (**self).pusher()
    }

    fn close_notifier(&mut self) -> Option<&mut dyn CloseNotifier> {
        (**self).close_notifier()
    }
}

impl<T: ResponseSink + ?Sized> ResponseSink for Box<T> {
    #[inline]
    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    #[inline]
    fn write_header(&mut self, status: StatusCode) {
        (**self).write_header(status);
    }

    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    #[inline]
    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        (**self).write_str(s)
    }

    fn hijacker(&mut self) -> Option<&mut dyn Hijacker> {
        (**self).hijacker()
    }

    fn flusher(&mut self) -> Option<&mut dyn Flusher> {
        (**self).flusher()
    }

    fn pusher(&mut self) -> Option<&mut dyn Pusher> {
        (**self).pusher()
    }

    fn close_notifier(&mut self) -> Option<&mut dyn CloseNotifier> {
        (**self).close_notifier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PlainSink {
        headers: HeaderMap,
        statuses: Vec<StatusCode>,
        body: Vec<u8>,
    }

    impl PlainSink {
        fn new() -> Self {
            Self { headers: HeaderMap::new(), statuses: vec![], body: vec![] }
        }
    }

    impl ResponseSink for PlainSink {
        fn headers_mut(&mut self) -> &mut HeaderMap {
            &mut self.headers
        }

        fn write_header(&mut self, status: StatusCode) {
            self.statuses.push(status);
        }

        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.body.extend_from_slice(buf);
            Ok(buf.len())
        }
    }

    struct FlushingSink {
        inner: PlainSink,
        flusher: MockFlusher,
    }

    impl ResponseSink for FlushingSink {
        fn headers_mut(&mut self) -> &mut HeaderMap {
            self.inner.headers_mut()
        }

        fn write_header(&mut self, status: StatusCode) {
            self.inner.write_header(status);
        }

        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.inner.write(buf)
        }

        fn flusher(&mut self) -> Option<&mut dyn Flusher> {
            Some(&mut self.flusher)
        }
    }

    #[test]
    fn capabilities_default_to_absent() {
        let mut sink = PlainSink::new();

        assert!(sink.hijacker().is_none());
        assert!(sink.flusher().is_none());
        assert!(sink.pusher().is_none());
        assert!(sink.close_notifier().is_none());
    }

    #[test]
    fn write_str_uses_the_byte_path() {
        let mut sink = PlainSink::new();

        assert_eq!(sink.write_str("text").unwrap(), 4);
        assert_eq!(sink.body, b"text");
    }

    fn flush_through<S: ResponseSink>(mut sink: S) -> io::Result<()> {
        sink.write_header(StatusCode::ACCEPTED);
        assert!(sink.hijacker().is_none());
        sink.flusher().expect("flush capability").flush()
    }

    #[test]
    fn borrowed_and_boxed_sinks_forward_capabilities() {
        let mut flusher = MockFlusher::new();
        flusher.expect_flush().times(2).returning(|| Ok(()));
        let mut sink = FlushingSink { inner: PlainSink::new(), flusher };

        flush_through(&mut sink).unwrap();
        assert_eq!(sink.inner.statuses, vec![StatusCode::ACCEPTED]);

        let boxed: Box<dyn ResponseSink> = Box::new(sink);
        flush_through(boxed).unwrap();
    }
}
