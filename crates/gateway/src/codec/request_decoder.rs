//! HTTP request decoder module
//!
//! Decodes a byte stream into a sequence of [`Message`]s: one header message per request
//! followed by that request's payload items, the last of which is always
//! [`PayloadItem::Eof`].
//!
//! # Example
//!
//! ```no_run
//! use micro_gateway::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from("GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");
//! let result = decoder.decode(&mut buffer);
//! ```

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, RequestHead};

/// A decoder for HTTP requests that handles both headers and payload
///
/// The decoder maintains its state through the `payload_decoder` field:
/// - `None`: Currently parsing headers
/// - `Some(PayloadDecoder)`: Currently parsing payload
#[derive(Debug, Default)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for RequestDecoder {
    type Item = Message<(RequestHead, PayloadSize)>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // parse payload if have payload_decoder
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let message = match payload_decoder.decode(src)? {
                Some(item @ PayloadItem::Chunk(_)) => Some(Message::Payload(item)),
                Some(item @ PayloadItem::Eof) => {
                    // no need payload decoder in this request now
                    self.payload_decoder.take();
                    Some(Message::Payload(item))
                }
                None => None,
            };

            return Ok(message);
        }

        let message = match self.header_decoder.decode(src)? {
            Some((head, payload_size)) => {
                self.payload_decoder = Some(payload_size.into());
                Some(Message::Header((head, payload_size)))
            }
            None => None,
        };

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn pipelined_requests() {
        let str = indoc! {r##"
        POST /submit HTTP/1.1
        Content-Length: 5

        helloGET /next HTTP/1.1
        Host: localhost

        "##};

        let mut buffer = BytesMut::from(str);
        let mut decoder = RequestDecoder::new();

        let Some(Message::Header((head, _))) = decoder.decode(&mut buffer).unwrap() else { panic!("expected head") };
        assert_eq!(head.path(), "/submit");

        let Some(Message::Payload(chunk)) = decoder.decode(&mut buffer).unwrap() else { panic!("expected body") };
        assert_eq!(chunk.as_bytes().unwrap().as_ref(), b"hello");

        let Some(Message::Payload(eof)) = decoder.decode(&mut buffer).unwrap() else { panic!("expected eof") };
        assert!(eof.is_eof());

        let Some(Message::Header((head, payload_size))) = decoder.decode(&mut buffer).unwrap() else { panic!("expected head") };
        assert_eq!(head.path(), "/next");
        assert!(payload_size.is_empty());

        let Some(Message::Payload(eof)) = decoder.decode(&mut buffer).unwrap() else { panic!("expected eof") };
        assert!(eof.is_eof());
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
    }
}
