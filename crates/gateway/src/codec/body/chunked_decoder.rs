//! Decoder for request bodies sent with chunked transfer-encoding (RFC 9112 section 7.1).
//!
//! Works as a byte-level state machine so a frame may be split across any number of reads.
//! Chunk extensions and trailer fields are consumed and discarded.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::{ParseError, PayloadItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: State,
    remaining: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// hex digits of the chunk size
    Size,
    /// whitespace or extensions up to CR
    SizeTail,
    /// LF closing the size line
    SizeLf,
    /// chunk data
    Data,
    /// CR after chunk data
    DataCr,
    /// LF after chunk data
    DataLf,
    /// start of a trailer line, or the final CR
    TrailerStart,
    /// inside a trailer line
    Trailer,
    /// LF closing a trailer line
    TrailerLf,
    /// final LF
    EndLf,
    /// body complete
    End,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: State::Size, remaining: 0 }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if self.state == State::End {
                trace!("finished reading chunked data");
                return Ok(Some(PayloadItem::Eof));
            }

            if src.is_empty() {
                return Ok(None);
            }

            if self.state == State::Data {
                let len = self.remaining.min(src.len() as u64);
                #[allow(clippy::cast_possible_truncation, reason = "len is bounded by src.len()")]
                let bytes = src.split_to(len as usize).freeze();
                self.remaining -= len;
                if self.remaining == 0 {
                    self.state = State::DataCr;
                }
                trace!(len = bytes.len(), "read chunked bytes");
                return Ok(Some(PayloadItem::Chunk(bytes)));
            }

            let byte = src.get_u8();
            self.state = self.step(byte)?;
        }
    }
}

impl ChunkedDecoder {
    fn step(&mut self, byte: u8) -> Result<State, ParseError> {
        let next = match (self.state, byte) {
            (State::Size, b) if b.is_ascii_hexdigit() => {
                let digit = u64::from(hex_value(b));
                self.remaining = self
                    .remaining
                    .checked_mul(16)
                    .and_then(|size| size.checked_add(digit))
                    .ok_or_else(|| ParseError::invalid_body("invalid overflow chunked length"))?;
                State::Size
            }
            (State::Size | State::SizeTail, b'\r') => State::SizeLf,
            (State::Size | State::SizeTail, b'\t' | b' ' | b';') => State::SizeTail,
            (State::SizeTail, b) if b != b'\n' => State::SizeTail,
            (State::SizeLf, b'\n') if self.remaining == 0 => State::TrailerStart,
            (State::SizeLf, b'\n') => State::Data,
            (State::DataCr, b'\r') => State::DataLf,
            (State::DataLf, b'\n') => State::Size,
            (State::TrailerStart, b'\r') => State::EndLf,
            (State::Trailer, b'\r') => State::TrailerLf,
            (State::TrailerStart | State::Trailer, _) => State::Trailer,
            (State::TrailerLf, b'\n') => State::TrailerStart,
            (State::EndLf, b'\n') => State::End,
            (state, b) => {
                return Err(ParseError::invalid_body(format!("invalid chunked byte {b:#04x} in state {state:?}")));
            }
        };
        Ok(next)
    }
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}
