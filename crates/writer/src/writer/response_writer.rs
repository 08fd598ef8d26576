use std::io;

use http::{HeaderMap, StatusCode};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::protocol::{Capability, WriterError};
use crate::sink::{Hijacked, Pusher, ResponseSink};

/// Status reported when a handler never sets one.
pub const DEFAULT_STATUS: StatusCode = StatusCode::OK;

/// Whether the response head has reached the sink, and how much body followed it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteState {
    /// nothing emitted yet, the status can still change
    Unwritten,
    /// head emitted, `size` body bytes accepted by the sink
    Written { size: usize },
}

/// Response writer handed to request handlers and middlewares.
///
/// The status line and headers are held back until the first body write or an
/// explicit [`write_header_now`](ResponseWriter::write_header_now), so the
/// status may change freely until then. The writer also records the status and
/// the number of body bytes written, and re-exposes the optional capabilities of
/// the sink it wraps.
///
/// A writer is meant to be reused: the serving loop creates it once and calls
/// [`reset`](ResponseWriter::reset) with the sink of every new request.
#[derive(Debug)]
pub struct ResponseWriter<S> {
    sink: S,
    status: StatusCode,
    state: WriteState,
}

impl<S: ResponseSink> ResponseWriter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink, status: DEFAULT_STATUS, state: WriteState::Unwritten }
    }

    /// Binds the writer to the sink of the next request and forgets the previous
    /// request, returning the sink it was bound to.
    pub fn reset(&mut self, sink: S) -> S {
        self.status = DEFAULT_STATUS;
        self.state = WriteState::Unwritten;
        std::mem::replace(&mut self.sink, sink)
    }

    /// Records the status code to send.
    ///
    /// `0` is ignored. Once the head was emitted the new code only replaces the
    /// tracked value, the client keeps the status it already received.
    pub fn set_status(&mut self, code: u16) {
        if code == 0 {
            return;
        }

        let Ok(status) = StatusCode::from_u16(code) else {
            warn!(code, "ignore invalid status code");
            return;
        };

        if status != self.status {
            if self.is_written() {
                warn!(
                    current = self.status.as_u16(),
                    wanted = status.as_u16(),
                    "headers were already written, status code override does not reach the client"
                );
            }
            self.status = status;
        }
    }

    /// Emits the status line and headers if that has not happened yet.
    pub fn write_header_now(&mut self) {
        if self.state == WriteState::Unwritten {
            self.state = WriteState::Written { size: 0 };
            self.sink.write_header(self.status);
        }
    }

    /// Writes body bytes, emitting the head first when needed.
    ///
    /// The sink's result is returned as is, the byte count of a successful write
    /// is added to [`size`](ResponseWriter::size).
    pub fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.write_header_now();
        let n = self.sink.write(data)?;
        self.add_size(n);
        Ok(n)
    }

    /// Same as [`write`](ResponseWriter::write) through the sink's text path.
    pub fn write_str(&mut self, s: &str) -> io::Result<usize> {
        self.write_header_now();
        let n = self.sink.write_str(s)?;
        self.add_size(n);
        Ok(n)
    }

    #[inline]
    fn add_size(&mut self, n: usize) {
        if let WriteState::Written { size } = &mut self.state {
            *size += n;
        }
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Body bytes written so far, `None` while the head is unwritten.
    #[inline]
    pub fn size(&self) -> Option<usize> {
        match self.state {
            WriteState::Unwritten => None,
            WriteState::Written { size } => Some(size),
        }
    }

    /// Returns true once the head was emitted, even with an empty body so far.
    #[inline]
    pub fn is_written(&self) -> bool {
        self.state != WriteState::Unwritten
    }

    #[inline]
    pub fn state(&self) -> WriteState {
        self.state
    }

    /// Headers of the sink, only effective before the head is emitted.
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.sink.headers_mut()
    }

    /// Hands the raw connection over to the caller.
    ///
    /// The writer is useless for this request afterwards.
    ///
    /// # Errors
    ///
    /// [`WriterError::Unsupported`] if the sink can not be hijacked, the writer
    /// state is left untouched in that case. Errors of the sink are passed on.
    pub fn hijack(&mut self) -> Result<Hijacked, WriterError> {
        let Some(hijacker) = self.sink.hijacker() else {
            return Err(WriterError::unsupported(Capability::Hijack));
        };

        // the head is never emitted through the writer after a hijack
        if self.state == WriteState::Unwritten {
            self.state = WriteState::Written { size: 0 };
        }
        debug!(status = self.status.as_u16(), "hijack response connection");
        hijacker.hijack()
    }

    /// Returns a receiver completing when the client connection goes away.
    ///
    /// # Errors
    ///
    /// [`WriterError::Unsupported`] if the sink has no close notification.
    pub fn close_notify(&mut self) -> Result<oneshot::Receiver<()>, WriterError> {
        match self.sink.close_notifier() {
            Some(notifier) => Ok(notifier.close_notify()),
            None => Err(WriterError::unsupported(Capability::CloseNotify)),
        }
    }

    /// Sends any buffered data to the client.
    ///
    /// # Errors
    ///
    /// [`WriterError::Unsupported`] if the sink can not flush, or the flush error.
    pub fn flush(&mut self) -> Result<(), WriterError> {
        let flusher = self.sink.flusher().ok_or_else(|| WriterError::unsupported(Capability::Flush))?;
        Ok(flusher.flush()?)
    }

    /// Server push handle of the sink, `None` when the sink can not push.
    pub fn pusher(&mut self) -> Option<&mut dyn Pusher> {
        self.sink.pusher()
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[inline]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// `flush` is a no-op for sinks without the flush capability.
impl<S: ResponseSink> io::Write for ResponseWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ResponseWriter::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.sink.flusher() {
            Some(flusher) => flusher.flush(),
            None => Ok(()),
        }
    }
}
