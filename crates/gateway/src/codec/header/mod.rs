//! HTTP header processing module for encoding and decoding headers
//!
//! - [`HeaderDecoder`]: Decodes request heads from raw bytes
//!   - Enforces header count and size limits
//!   - Determines how the request body is delimited
//!
//! - [`HeaderEncoder`]: Encodes the response header block
//!   - Emits the gateway-owned `Server`, `Date` and `Connection` lines
//!   - Emits the chunked framing line for chunked responses

mod header_decoder;
mod header_encoder;

pub use header_decoder::HeaderDecoder;
pub use header_encoder::HeaderEncoder;
