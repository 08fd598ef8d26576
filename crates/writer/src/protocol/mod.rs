//! Core HTTP response abstractions shared by the writer, the sinks and the codec.
//!
//! - **Message Handling** ([`message`]): payload items and framing decisions
//!   - [`PayloadItem`]: a body chunk or the EOF marker
//!   - [`PayloadSize`]: fixed length, chunked or empty framing
//!
//! - **Response Processing** ([`response`]): response header handling
//!   - [`ResponseHead`]: type alias for response headers before emission
//!
//! - **Error Handling** ([`error`]):
//!   - [`WriterError`]: errors surfaced by the writer and sink capabilities
//!   - [`SendError`]: response encoding errors
//!   - [`Capability`]: names an optional sink behavior

mod message;
pub use message::PayloadItem;
pub use message::PayloadSize;
pub use message::body_allowed;

mod response;
pub use response::ResponseHead;

mod error;
pub use error::Capability;
pub use error::SendError;
pub use error::WriterError;
