use bytes::{Buf, Bytes};
use http::{HeaderMap, StatusCode, header};

/// Represents an item in the HTTP response payload stream.
///
/// This enum is fed to the payload encoders to produce either data chunks
/// or signal the end of the payload stream (EOF).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    /// A chunk of payload data
    Chunk(Data),
    /// Marks the end of the payload stream
    Eof,
}

/// Represents the size information of an HTTP payload.
///
/// This enum is used to determine how the payload should be framed:
/// - Known length: Send exact number of bytes
/// - Chunked: Send using chunked transfer encoding
/// - Empty: No payload to send
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Payload with known length in bytes
    Length(u64),
    /// Payload using chunked transfer encoding
    Chunked,
    /// Empty payload (no body)
    Empty,
}

impl PayloadSize {
    /// Decides the framing of a response body from its status and headers.
    ///
    /// Statuses that never carry a body (1xx, 204, 304) are empty. A valid
    /// `Content-Length` header fixes the length, anything else falls back to
    /// chunked transfer encoding.
    pub fn for_response(status: StatusCode, headers: &HeaderMap) -> Self {
        if !body_allowed(status) {
            return PayloadSize::Empty;
        }

        let content_length = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());

        match content_length {
            Some(0) => PayloadSize::Empty,
            Some(length) => PayloadSize::Length(length),
            None => PayloadSize::Chunked,
        }
    }
}

/// Returns false for statuses whose responses must not include a body.
#[inline]
pub fn body_allowed(status: StatusCode) -> bool {
    !(status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED)
}
