//! HTTP response header handling.
//!
//! Uses the standard `http::Response` type with an empty body placeholder
//! to represent the status and headers a sink collects before emission.

use http::Response;

/// Type alias for HTTP response headers.
///
/// The header map is filled by handlers while the response is unwritten; the
/// status is stamped on at emission time.
pub type ResponseHead = Response<()>;
