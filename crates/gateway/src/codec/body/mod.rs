//! HTTP body codecs
//!
//! ## Decoders (request side)
//! - [`PayloadDecoder`]: picks a Content-Length, chunked or no-body strategy
//!
//! ## Encoders (response side)
//! - [`PayloadEncoder`]: writes body bytes raw or as chunked frames

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod payload_decoder;
mod payload_encoder;
mod raw_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
