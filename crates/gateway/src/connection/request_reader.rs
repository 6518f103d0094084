use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::{debug, warn};

use crate::codec::RequestDecoder;
use crate::protocol::body::RequestBody;
use crate::protocol::{Message, ParseError, RequestHead};

/// Pulls parsed requests off the read half of a connection.
#[derive(Debug)]
pub struct RequestReader<R> {
    framed: FramedRead<R, RequestDecoder>,
}

/// One request as handed to the context builder: its head plus a body that borrows the
/// reader until the exchange is over.
#[derive(Debug)]
pub struct ParsedRequest<'conn, R> {
    pub head: RequestHead,
    pub body: RequestBody<'conn, R>,
}

impl<R> RequestReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn with_capacity(reader: R, buffer_size: usize) -> Self {
        Self { framed: FramedRead::with_capacity(reader, RequestDecoder::new(), buffer_size) }
    }

    /// Waits for the next request head.
    ///
    /// Returns `Ok(None)` when the peer closed the stream between requests. Body items a
    /// previous exchange left unread are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` on malformed input or transport failure.
    pub async fn next_request(&mut self) -> Result<Option<ParsedRequest<'_, R>>, ParseError> {
        loop {
            match self.framed.next().await {
                Some(Ok(Message::Header((head, payload_size)))) => {
                    debug!(method = %head.method(), path = head.path(), version = head.version_str(), "received request head");
                    let body = RequestBody::new(&mut self.framed, payload_size);
                    return Ok(Some(ParsedRequest { head, body }));
                }
                Some(Ok(Message::Payload(item))) => {
                    warn!(eof = item.is_eof(), "skip stale request payload");
                }
                Some(Err(e)) => return Err(e),
                None => {
                    debug!("request stream ended");
                    return Ok(None);
                }
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.framed.into_inner()
    }
}
