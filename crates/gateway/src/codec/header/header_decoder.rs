//! HTTP header decoder for parsing request heads
//!
//! Parses the request line and header block with `httparse` and produces a
//! [`RequestHead`] together with the [`PayloadSize`] that tells the payload decoder how
//! the body is delimited.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum header size: 8KB
//! - Only HTTP/1.0 and HTTP/1.1

use bytes::{Buf, BytesMut};
use http::{Method, Version};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{ParseError, PayloadSize, RequestHead};

/// Maximum number of headers allowed in a request
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire header section
const MAX_HEADER_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderDecoder;

impl Decoder for HeaderDecoder {
    type Item = (RequestHead, PayloadSize);
    type Error = ParseError;

    /// Attempts to decode a request head from the provided bytes buffer.
    ///
    /// - `Ok(Some((head, payload_size)))` once the whole head is buffered; the head bytes
    ///   are consumed from `src`
    /// - `Ok(None)` if more data is needed
    /// - `Err(ParseError)` on malformed input or exceeded limits
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut req = httparse::Request::new(&mut headers);

        let parsed = req.parse(src).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            e => ParseError::invalid_header(e.to_string()),
        })?;

        let body_offset = match parsed {
            Status::Complete(body_offset) => body_offset,
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                return Ok(None);
            }
        };

        trace!(head_size = body_offset, "parsed request head");
        ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

        let version = match req.version {
            Some(0) => Version::HTTP_10,
            Some(1) => Version::HTTP_11,
            // Currently HTTP/2 and HTTP/3 not supported
            _ => return Err(ParseError::InvalidVersion(req.version)),
        };

        let method = req.method.ok_or(ParseError::InvalidMethod)?;
        let method = Method::from_bytes(method.as_bytes()).map_err(|_| ParseError::InvalidMethod)?;
        let target = req.path.ok_or(ParseError::InvalidUri)?;

        // httparse already rejected illegal name bytes; values may carry obs-text
        let header_list = req
            .headers
            .iter()
            .map(|h| (h.name.to_owned(), String::from_utf8_lossy(h.value).into_owned()))
            .collect();

        let head = RequestHead::new(method, target, version, header_list);
        src.advance(body_offset);

        let payload_size = parse_payload(&head)?;
        Ok(Some((head, payload_size)))
    }
}

/// Determines how the request body is delimited (RFC 9112 section 6).
///
/// Framing comes from Transfer-Encoding or Content-Length whatever the method. A request
/// with neither header has no body.
///
/// # Errors
///
/// Returns `ParseError` if both Content-Length and Transfer-Encoding are present,
/// Transfer-Encoding does not end with `chunked`, or Content-Length is not a valid `u64`.
fn parse_payload(head: &RequestHead) -> Result<PayloadSize, ParseError> {
    // refer: https://www.rfc-editor.org/rfc/rfc9112.html#name-message-body-length
    match (head.header("transfer-encoding"), head.header("content-length")) {
        (None, None) => Ok(PayloadSize::Empty),

        (Some(te_value), None) => {
            ensure!(
                is_chunked(te_value),
                ParseError::invalid_header(format!("transfer-encoding {te_value} does not end with chunked"))
            );
            Ok(PayloadSize::Chunked)
        }

        (None, Some(cl_value)) => {
            let length = cl_value
                .trim()
                .parse::<u64>()
                .map_err(|_| ParseError::invalid_content_length(format!("value {cl_value} is not u64")))?;

            Ok(if length == 0 { PayloadSize::Empty } else { PayloadSize::Length(length) })
        }

        (Some(_), Some(_)) => Err(ParseError::invalid_content_length("transfer_encoding and content_length both present in headers")),
    }
}

/// Checks if chunked is the final encoding in a Transfer-Encoding value.
fn is_chunked(value: &str) -> bool {
    value.rsplit(',').next().is_some_and(|last| last.trim().eq_ignore_ascii_case("chunked"))
}
