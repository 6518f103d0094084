use std::io;
use std::io::ErrorKind;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::codec::body::PayloadEncoder;
use crate::codec::header::HeaderEncoder;
use crate::protocol::{Message, ResponsePreamble, SendError};

/// Encodes one response at a time: a header block, then payload items until `Eof`.
#[derive(Debug, Default)]
pub struct ResponseEncoder {
    header_encoder: HeaderEncoder,
    payload_encoder: Option<PayloadEncoder>,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets a response that was abandoned before its `Eof`.
    pub fn reset(&mut self) {
        self.payload_encoder = None;
    }
}

impl<D: Buf> Encoder<Message<ResponsePreamble<'_>, D>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Message<ResponsePreamble<'_>, D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Message::Header(preamble) => {
                if self.payload_encoder.is_some() {
                    error!("expect payload item but receive response head");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                }

                let payload_encoder = if preamble.head.is_chunked() { PayloadEncoder::chunked() } else { PayloadEncoder::raw() };
                self.payload_encoder = Some(payload_encoder);
                self.header_encoder.encode(preamble, dst)
            }

            Message::Payload(payload_item) => {
                let Some(payload_encoder) = &mut self.payload_encoder else {
                    error!("expect response header but receive payload item");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                };

                let result = payload_encoder.encode(payload_item, dst);

                if payload_encoder.is_finish() {
                    self.payload_encoder.take();
                }

                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{PayloadItem, ResponseHead};

    fn preamble(head: &ResponseHead) -> ResponsePreamble<'_> {
        ResponsePreamble { head, server: "s", date: "d", connection: "close" }
    }

    #[test]
    fn payload_before_header_is_rejected() {
        let mut encoder = ResponseEncoder::new();
        let mut dst = BytesMut::new();
        let result = encoder.encode(Message::<ResponsePreamble<'_>, &[u8]>::Payload(PayloadItem::Chunk(&b"x"[..])), &mut dst);
        assert!(result.is_err());
    }

    #[test]
    fn second_header_needs_eof_first() {
        let head = ResponseHead::new("200 OK", [("Transfer-Encoding", "chunked")]).unwrap();
        let mut encoder = ResponseEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(Message::<_, &[u8]>::Header(preamble(&head)), &mut dst).unwrap();
        assert!(encoder.encode(Message::<_, &[u8]>::Header(preamble(&head)), &mut dst).is_err());

        encoder.encode(Message::<ResponsePreamble<'_>, &[u8]>::Payload(PayloadItem::Chunk(&b"abc"[..])), &mut dst).unwrap();
        encoder.encode(Message::<ResponsePreamble<'_>, &[u8]>::Payload(PayloadItem::Eof), &mut dst).unwrap();
        encoder.encode(Message::<_, &[u8]>::Header(preamble(&head)), &mut dst).unwrap();

        let wire = String::from_utf8(dst.to_vec()).unwrap();
        assert_eq!(wire.matches("HTTP/1.1 200 OK\r\n").count(), 2);
        assert!(wire.contains("\r\n\r\n3\r\nabc\r\n0\r\n\r\nHTTP/1.1"));
    }
}
