use std::io;
use std::io::{ErrorKind, Write};
use std::mem;

use bytes::{Buf, Bytes, BytesMut};
use http::{HeaderMap, HeaderValue, StatusCode, header};
use tokio::sync::oneshot;
use tokio_util::codec::Encoder;
use tracing::{debug, error, info, warn};

use crate::codec::{HeaderEncoder, PayloadEncoder};
use crate::protocol::{PayloadItem, PayloadSize, ResponseHead, SendError, WriterError};
use crate::sink::{CloseNotifier, Connection, Flusher, Hijacked, Hijacker, ResponseSink};

/// Initial capacity of the write buffer
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// Buffered bytes that trigger a write to the connection
pub const DEFAULT_MAX_BUFFERED: usize = 64 * 1024;

/// Builder of a [`StreamSink`].
#[derive(Debug)]
pub struct StreamSinkBuilder<C> {
    conn: C,
    buffer_capacity: usize,
    max_buffered: usize,
    read_buf: Bytes,
}

impl<C> StreamSinkBuilder<C>
where
    C: Connection + 'static,
{
    fn new(conn: C) -> Self {
        Self { conn, buffer_capacity: DEFAULT_BUFFER_CAPACITY, max_buffered: DEFAULT_MAX_BUFFERED, read_buf: Bytes::new() }
    }

    /// initial capacity of the write buffer
    pub fn buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = buffer_capacity;
        self
    }

    /// buffered size that makes a body write go out to the connection, at least 1
    pub fn max_buffered(mut self, max_buffered: usize) -> Self {
        self.max_buffered = max_buffered.max(1);
        self
    }

    /// bytes the driver already read from the connection past the request head,
    /// handed out by a hijack
    pub fn read_buf(mut self, read_buf: impl Into<Bytes>) -> Self {
        self.read_buf = read_buf.into();
        self
    }

    pub fn build(self) -> StreamSink<C> {
        StreamSink {
            conn: Some(self.conn),
            buffer: BytesMut::with_capacity(self.buffer_capacity),
            max_buffered: self.max_buffered,
            head: ResponseHead::default(),
            encoder: None,
            deferred_error: None,
            read_buf: self.read_buf,
            close_waiters: Vec::new(),
            closed: false,
        }
    }
}

/// An HTTP/1.1 response sink over a byte stream.
///
/// The head is encoded once on [`write_header`](ResponseSink::write_header), body
/// bytes are framed by content-length or chunked encoding and buffered until
/// `max_buffered` is reached, a flush is requested or the response is
/// [`finish`](StreamSink::finish)ed.
///
/// Besides the mandatory sink operations it supports hijacking, flushing and
/// close notification. Server push does not exist in HTTP/1.1.
#[derive(Debug)]
pub struct StreamSink<C> {
    conn: Option<C>,
    buffer: BytesMut,
    max_buffered: usize,
    head: ResponseHead,
    encoder: Option<PayloadEncoder>,
    deferred_error: Option<SendError>,
    read_buf: Bytes,
    close_waiters: Vec<oneshot::Sender<()>>,
    closed: bool,
}

impl<C> StreamSink<C>
where
    C: Connection + 'static,
{
    pub fn new(conn: C) -> Self {
        Self::builder(conn).build()
    }

    pub fn builder(conn: C) -> StreamSinkBuilder<C> {
        StreamSinkBuilder::new(conn)
    }

    /// The connection, `None` once hijacked.
    #[inline]
    pub fn get_ref(&self) -> Option<&C> {
        self.conn.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut C> {
        self.conn.as_mut()
    }

    pub fn into_inner(self) -> Option<C> {
        self.conn
    }

    /// Returns true once the response head was encoded.
    #[inline]
    pub fn is_header_written(&self) -> bool {
        self.encoder.is_some()
    }

    #[inline]
    pub fn is_hijacked(&self) -> bool {
        self.conn.is_none()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Completes the response: an empty `200` if no head was written, the end of
    /// the body, then everything buffered goes out to the connection.
    ///
    /// # Errors
    ///
    /// Fails if the body is shorter than its declared content-length, the
    /// connection was hijacked, or writing to the connection fails.
    pub fn finish(&mut self) -> io::Result<()> {
        self.ensure_connected()?;

        if self.encoder.is_none() {
            self.head.headers_mut().entry(header::CONTENT_LENGTH).or_insert(HeaderValue::from_static("0"));
            self.write_header(StatusCode::OK);
        }
        self.take_deferred_error()?;

        if let Some(encoder) = self.encoder.as_mut()
            && !encoder.is_finish()
        {
            encoder.encode(PayloadItem::<&[u8]>::Eof, &mut self.buffer)?;
        }

        Flusher::flush(self)
    }

    /// Marks the client connection as closed and completes every close
    /// notification receiver.
    ///
    /// The connection driver calls this once it reads EOF from the client.
    pub fn notify_closed(&mut self) {
        if !self.closed {
            info!(waiters = self.close_waiters.len(), "client connection closed");
        }
        self.closed = true;
        for waiter in self.close_waiters.drain(..) {
            // the receiver may be gone already
            let _ = waiter.send(());
        }
    }

    fn ensure_connected(&self) -> io::Result<()> {
        if self.conn.is_none() {
            return Err(io::Error::new(ErrorKind::NotConnected, WriterError::Hijacked));
        }
        Ok(())
    }

    fn take_deferred_error(&mut self) -> io::Result<()> {
        match self.deferred_error.take() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Passes `result` through, closing the sink if it reports a lost client.
    fn observe<T>(&mut self, result: io::Result<T>) -> io::Result<T> {
        if let Err(e) = &result
            && is_disconnect(e.kind())
        {
            debug!(cause = %e, "connection lost while writing response");
            self.notify_closed();
        }
        result
    }

    /// Writes the buffer out, dropping every byte the connection accepted so a
    /// failed flush can be retried without sending anything twice.
    fn flush_buffer(&mut self) -> io::Result<()> {
        while !self.buffer.is_empty() {
            let Some(conn) = self.conn.as_mut() else {
                return Err(io::Error::new(ErrorKind::NotConnected, WriterError::Hijacked));
            };
            match conn.write(&self.buffer) {
                Ok(0) => return self.observe(Err(io::Error::from(ErrorKind::WriteZero))),
                Ok(n) => self.buffer.advance(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return self.observe(Err(e)),
            }
        }
        Ok(())
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof
            | ErrorKind::WriteZero
    )
}

impl<C> ResponseSink for StreamSink<C>
where
    C: Connection + 'static,
{
    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.head.headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.encoder.is_some() {
            warn!(status = status.as_u16(), "superfluous write_header call");
            return;
        }

        let mut head = mem::take(&mut self.head);
        *head.status_mut() = status;
        let payload_size = PayloadSize::for_response(status, head.headers());
        self.encoder = Some(PayloadEncoder::from(payload_size));

        if let Err(e) = HeaderEncoder.encode((head, payload_size), &mut self.buffer) {
            error!(cause = %e, "failed to encode response head");
            self.deferred_error = Some(e);
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ensure_connected()?;
        if self.encoder.is_none() {
            self.write_header(StatusCode::OK);
        }
        self.take_deferred_error()?;

        let encoder = self.encoder.as_mut().ok_or_else(|| io::Error::other("response head is missing"))?;
        encoder.encode(PayloadItem::Chunk(buf), &mut self.buffer)?;

        // the chunk is encoded and goes out with a later flush, so a failure
        // here surfaces from `flush` or `finish` instead
        if self.buffer.len() >= self.max_buffered
            && let Err(e) = self.flush_buffer()
        {
            debug!(cause = %e, buffered = self.buffer.len(), "flush on write failed, keep the buffer");
        }
        Ok(buf.len())
    }

    fn hijacker(&mut self) -> Option<&mut dyn Hijacker> {
        Some(self)
    }

    fn flusher(&mut self) -> Option<&mut dyn Flusher> {
        Some(self)
    }

    fn close_notifier(&mut self) -> Option<&mut dyn CloseNotifier> {
        Some(self)
    }
}

impl<C> Hijacker for StreamSink<C>
where
    C: Connection + 'static,
{
    /// Sends what is buffered, then gives up the connection.
    fn hijack(&mut self) -> Result<Hijacked, WriterError> {
        if self.conn.is_none() {
            return Err(WriterError::Hijacked);
        }
        self.flush_buffer()?;

        let conn = self.conn.take().ok_or(WriterError::Hijacked)?;
        debug!(read_buf = self.read_buf.len(), "connection hijacked");
        Ok(Hijacked::new(Box::new(conn), mem::take(&mut self.read_buf)))
    }
}

impl<C> Flusher for StreamSink<C>
where
    C: Connection + 'static,
{
    fn flush(&mut self) -> io::Result<()> {
        self.take_deferred_error()?;
        self.flush_buffer()?;

        let Some(conn) = self.conn.as_mut() else {
            return Err(io::Error::new(ErrorKind::NotConnected, WriterError::Hijacked));
        };
        let result = conn.flush();
        self.observe(result)
    }
}

impl<C> CloseNotifier for StreamSink<C>
where
    C: Connection + 'static,
{
    fn close_notify(&mut self) -> oneshot::Receiver<()> {
        let (sender, receiver) = oneshot::channel();
        if self.closed {
            let _ = sender.send(());
        } else {
            self.close_waiters.push(sender);
        }
        receiver
    }
}
