//! Response head encoding.

mod header_encoder;

pub use header_encoder::HeaderEncoder;
