//! Response body encoders: fixed length, chunked transfer encoding and no body.

mod chunked_encoder;
mod length_encoder;
mod payload_encoder;

pub use payload_encoder::PayloadEncoder;
