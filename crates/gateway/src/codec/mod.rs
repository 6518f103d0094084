//! HTTP codec module for encoding and decoding HTTP messages
//!
//! - Request handling:
//!   - [`RequestDecoder`]: Decodes incoming HTTP requests into heads and payload items
//! - Response handling:
//!   - [`ResponseEncoder`]: Encodes the response header block and raw or chunked body
//!
//! Both sides plug into `tokio_util::codec`, so the request side runs inside a
//! `FramedRead` and the response side encodes into the session's write buffer.

mod body;
mod header;
mod request_decoder;
mod response_encoder;

pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
