use bytes::{Buf, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::codec::ResponseEncoder;
use crate::protocol::{Message, ResponsePreamble, SendError};

/// Encodes response messages into an owned buffer and pushes them to the transport on `flush`.
#[derive(Debug)]
pub struct MessageWriter<W> {
    writer: W,
    buffer: BytesMut,
    encoder: ResponseEncoder,
}

impl<W> MessageWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn with_capacity(writer: W, buffer_size: usize) -> Self {
        Self { writer, buffer: BytesMut::with_capacity(buffer_size), encoder: ResponseEncoder::new() }
    }

    /// The raw transport, for writes that bypass response framing.
    #[inline]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Drops buffered bytes and encoder state left by an abandoned response.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.encoder.reset();
    }

    #[inline]
    pub fn write<D>(&mut self, item: Message<ResponsePreamble<'_>, D>) -> Result<(), SendError>
    where
        D: Buf,
    {
        self.encoder.encode(item, &mut self.buffer)
    }

    #[inline]
    pub async fn flush(&mut self) -> Result<(), SendError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        trace!(size = self.buffer.len(), "flush response bytes");
        self.writer.write_all(self.buffer.as_ref()).await?;
        self.buffer.clear();
        Ok(self.writer.flush().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{PayloadItem, ResponseHead};
    use bytes::Bytes;

    #[tokio::test]
    async fn flush_moves_buffer_to_transport() {
        let head = ResponseHead::new("204 No Content", Vec::<(&str, &str)>::new()).unwrap();
        let mut writer = MessageWriter::with_capacity(Vec::new(), 64);

        let preamble = ResponsePreamble { head: &head, server: "s", date: "d", connection: "close" };
        writer.write(Message::<_, Bytes>::Header(preamble)).unwrap();
        assert!(writer.get_ref().is_empty());

        writer.flush().await.unwrap();
        writer.write(Message::<ResponsePreamble<'_>, Bytes>::Payload(PayloadItem::Eof)).unwrap();
        writer.flush().await.unwrap();

        let written = String::from_utf8(writer.into_inner()).unwrap();
        assert!(written.starts_with("HTTP/1.1 204 No Content\r\nServer: s\r\nDate: d\r\nConnection: close\r\n\r\n"));
        assert_eq!(written.matches("HTTP/1.1").count(), 1);
    }

    #[tokio::test]
    async fn reset_discards_pending_bytes() {
        let head = ResponseHead::new("200 OK", Vec::<(&str, &str)>::new()).unwrap();
        let mut writer = MessageWriter::with_capacity(Vec::new(), 64);

        let preamble = ResponsePreamble { head: &head, server: "s", date: "d", connection: "close" };
        writer.write(Message::<_, Bytes>::Header(preamble)).unwrap();
        writer.reset();
        writer.flush().await.unwrap();

        assert!(writer.get_ref().is_empty());
    }
}
