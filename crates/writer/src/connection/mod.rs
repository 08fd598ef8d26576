//! Transport side of a response.
//!
//! # Components
//!
//! - [`StreamSink`]: an HTTP/1.1 [`ResponseSink`](crate::sink::ResponseSink) over any
//!   `Read + Write` stream that:
//!   - Encodes the response head once, with consistent framing headers
//!   - Frames the body with content-length or chunked transfer encoding
//!   - Buffers output until a threshold, an explicit flush or `finish`
//!   - Supports hijacking, flushing and close notification
//! - [`StreamSinkBuilder`]: configures buffer sizes and read-ahead bytes

mod stream_sink;

pub use stream_sink::DEFAULT_BUFFER_CAPACITY;
pub use stream_sink::DEFAULT_MAX_BUFFERED;
pub use stream_sink::StreamSink;
pub use stream_sink::StreamSinkBuilder;
