//! HTTP header encoder for serializing the response header block
//!
//! Writes, in order: the status line, the gateway-owned `Server`, `Date` and `Connection`
//! lines, a `Transfer-Encoding: chunked` framing line when the body is chunked, every
//! retained application header, and the blank line that ends the block.

use std::io;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

use crate::protocol::{ResponsePreamble, SendError};

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl Encoder<ResponsePreamble<'_>> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, item: ResponsePreamble<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let ResponsePreamble { head, server, date, connection } = item;

        dst.reserve(INIT_HEADER_SIZE);
        write!(FastWrite(dst), "HTTP/1.1 {}\r\n", head.status())?;
        write!(FastWrite(dst), "Server: {server}\r\nDate: {date}\r\nConnection: {connection}\r\n")?;

        if head.is_chunked() {
            dst.put_slice(b"Transfer-Encoding: chunked\r\n");
        }

        for (name, value) in head.headers() {
            dst.put_slice(name.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// `io::Write` adapter over `BytesMut` so `write!` can format straight into the buffer.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
