use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::StreamExt;
use http_body::{Body, Frame, SizeHint};
use http_body_util::BodyExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::info;

use crate::codec::RequestDecoder;
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize};

/// The body of the request currently being served.
///
/// Implements `http_body::Body`, so the usual `http_body_util::BodyExt` helpers
/// (`frame`, `collect`, ...) work on it.
pub struct RequestBody<'conn, R> {
    framed: &'conn mut FramedRead<R, RequestDecoder>,
    size: PayloadSize,
    eof: bool,
}

impl<'conn, R> RequestBody<'conn, R>
where
    R: AsyncRead + Unpin,
{
    pub(crate) fn new(framed: &'conn mut FramedRead<R, RequestDecoder>, size: PayloadSize) -> Self {
        Self { framed, size, eof: false }
    }

    /// How the body is delimited on the wire.
    pub fn payload_size(&self) -> PayloadSize {
        self.size
    }

    /// Reads the next chunk, or `None` once the body is complete.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the body is malformed or the peer goes away mid-body.
    pub async fn read_chunk(&mut self) -> Result<Option<Bytes>, ParseError> {
        loop {
            match self.frame().await {
                Some(Ok(frame)) => {
                    if let Ok(bytes) = frame.into_data() {
                        return Ok(Some(bytes));
                    }
                }
                Some(Err(e)) => return Err(e),
                None => return Ok(None),
            }
        }
    }

    /// Discards the unread remainder of the body and returns how many bytes were skipped.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the body is malformed or the peer goes away mid-body.
    pub async fn drain(&mut self) -> Result<usize, ParseError> {
        let mut size: usize = 0;
        while let Some(bytes) = self.read_chunk().await? {
            size += bytes.len();
        }
        if size > 0 {
            info!(size = size, "skip request body");
        }
        Ok(size)
    }
}

impl<R> Body for RequestBody<'_, R>
where
    R: AsyncRead + Unpin,
{
    type Data = Bytes;
    type Error = ParseError;

    fn poll_frame(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        if self.eof {
            return Poll::Ready(None);
        }

        let polled = ready!(self.framed.poll_next_unpin(cx));
        let frame = match polled {
            Some(Ok(Message::Payload(PayloadItem::Chunk(bytes)))) => return Poll::Ready(Some(Ok(Frame::data(bytes)))),
            Some(Ok(Message::Payload(PayloadItem::Eof))) => None,
            Some(Ok(Message::Header(_))) => Some(Err(ParseError::invalid_body("received header from receive body phase"))),
            Some(Err(e)) => Some(Err(e)),
            None => Some(Err(ParseError::invalid_body("connection closed before the body was complete"))),
        };

        self.eof = true;
        Poll::Ready(frame)
    }

    fn is_end_stream(&self) -> bool {
        self.eof
    }

    fn size_hint(&self) -> SizeHint {
        match self.size {
            PayloadSize::Length(n) => SizeHint::with_exact(n),
            PayloadSize::Empty => SizeHint::with_exact(0),
            PayloadSize::Chunked => SizeHint::default(),
        }
    }
}

impl<R> fmt::Debug for RequestBody<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBody").field("size", &self.size).field("eof", &self.eof).finish_non_exhaustive()
    }
}
