//! The response writer handed to request handlers.
//!
//! [`ResponseWriter`] decorates a [`ResponseSink`](crate::sink::ResponseSink): it defers the
//! response head until the body starts, tracks status and body size, and answers
//! capability queries on behalf of the sink.

mod response_writer;

pub use response_writer::DEFAULT_STATUS;
pub use response_writer::ResponseWriter;
pub use response_writer::WriteState;
