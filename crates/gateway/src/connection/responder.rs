//! The response side of one exchange.
//!
//! [`Responder`] is what an application calls `start_response` on. It owns the response
//! state for the current request and hands out [`ResponseWriter`]s that drive the wire
//! through `Idle -> HeadersPending -> HeadersSent -> Closed`. The header block is written
//! lazily: the first body write or `close` sends it, and later calls never resend it.

use std::time::SystemTime;

use bytes::Bytes;
use tokio::io::AsyncWrite;
use tracing::{debug, trace};

use crate::connection::MessageWriter;
use crate::protocol::header::format_http_date;
use crate::protocol::{BoxError, Message, PayloadItem, ResponseHead, ResponsePreamble, SendError, StartError};

#[derive(Debug)]
struct ResponseState {
    head: ResponseHead,
    headers_sent: bool,
    closed: bool,
}

/// Starts the response for the request currently being served.
#[derive(Debug)]
pub struct Responder<'conn, W> {
    writer: &'conn mut MessageWriter<W>,
    server: &'conn str,
    connection: &'static str,
    state: Option<ResponseState>,
}

impl<'conn, W> Responder<'conn, W>
where
    W: AsyncWrite + Unpin,
{
    pub(crate) fn new(writer: &'conn mut MessageWriter<W>, server: &'conn str, connection: &'static str) -> Self {
        Self { writer, server, connection, state: None }
    }

    /// Begins a response with `status` (e.g. `200 OK`) and the given header list.
    ///
    /// Pass `error` when restarting after a failure: if nothing has reached the wire yet the
    /// earlier response is replaced, otherwise the error comes back as
    /// [`StartError::AlreadyResponded`].
    ///
    /// # Errors
    ///
    /// - [`StartError::AlreadyStarted`] if a response exists and `error` is `None`
    /// - [`StartError::AlreadyResponded`] if `error` is given but headers were already sent
    /// - [`StartError::InvalidStatus`], [`StartError::InvalidHeaderType`] or
    ///   [`StartError::InvalidHeaderValue`] if the status or headers are malformed
    pub fn start_response<S, I, N, V>(&mut self, status: S, headers: I, error: Option<BoxError>) -> Result<ResponseWriter<'_, W>, StartError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        match (error, &self.state) {
            (Some(cause), Some(state)) if state.headers_sent => return Err(StartError::AlreadyResponded { cause }),
            (Some(cause), Some(_)) => debug!(cause = %cause, "replace unsent response"),
            (None, Some(_)) => return Err(StartError::AlreadyStarted),
            (_, None) => {}
        }

        let head = ResponseHead::new(status, headers)?;
        debug!(status = head.status(), chunked = head.is_chunked(), "start response");

        let state = self.state.insert(ResponseState { head, headers_sent: false, closed: false });
        Ok(ResponseWriter { writer: &mut *self.writer, state, server: self.server, connection: self.connection })
    }

    /// The writer of the response already started, if any.
    pub fn response(&mut self) -> Option<ResponseWriter<'_, W>> {
        let state = self.state.as_mut()?;
        Some(ResponseWriter { writer: &mut *self.writer, state, server: self.server, connection: self.connection })
    }

    pub fn is_started(&self) -> bool {
        self.state.is_some()
    }

    pub fn headers_sent(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.headers_sent)
    }

    /// The `Connection` value every response on this exchange carries.
    pub fn connection(&self) -> &'static str {
        self.connection
    }
}

/// Writes the header block and body of a started response.
#[derive(Debug)]
pub struct ResponseWriter<'r, W> {
    writer: &'r mut MessageWriter<W>,
    state: &'r mut ResponseState,
    server: &'r str,
    connection: &'static str,
}

impl<W> ResponseWriter<'_, W>
where
    W: AsyncWrite + Unpin,
{
    pub fn head(&self) -> &ResponseHead {
        &self.state.head
    }

    pub fn is_chunked(&self) -> bool {
        self.state.head.is_chunked()
    }

    pub fn headers_sent(&self) -> bool {
        self.state.headers_sent
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed
    }

    /// Writes the status line and header block. Does nothing once they are on the wire.
    ///
    /// # Errors
    ///
    /// Returns `SendError` if the transport fails.
    pub async fn send_headers(&mut self) -> Result<(), SendError> {
        if self.state.headers_sent {
            return Ok(());
        }

        let date = format_http_date(SystemTime::now());
        let preamble = ResponsePreamble { head: &self.state.head, server: self.server, date: &date, connection: self.connection };
        self.writer.write(Message::<_, Bytes>::Header(preamble))?;
        self.writer.flush().await?;

        self.state.headers_sent = true;
        debug!(status = self.state.head.status(), connection = self.connection, "sent response headers");
        Ok(())
    }

    /// Writes one piece of the body, sending the headers first if needed.
    ///
    /// On a chunked response every non-empty write becomes one chunk frame; empty writes emit
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns `SendError` if the response is already closed or the transport fails.
    pub async fn write(&mut self, data: impl AsRef<[u8]>) -> Result<(), SendError> {
        if self.state.closed {
            return Err(SendError::invalid_body("response already closed"));
        }

        self.send_headers().await?;

        let data = data.as_ref();
        self.writer.write(Message::<ResponsePreamble<'_>, _>::Payload(PayloadItem::Chunk(data)))?;
        self.writer.flush().await
    }

    /// Finishes the response: sends the headers if nothing was written and terminates a
    /// chunked body. Calling it again does nothing.
    ///
    /// # Errors
    ///
    /// Returns `SendError` if the transport fails.
    pub async fn close(&mut self) -> Result<(), SendError> {
        if self.state.closed {
            return Ok(());
        }

        self.send_headers().await?;
        self.writer.write(Message::<ResponsePreamble<'_>, Bytes>::Payload(PayloadItem::Eof))?;
        self.writer.flush().await?;

        self.state.closed = true;
        trace!(chunked = self.state.head.is_chunked(), "closed response");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER: &str = "micro-gateway/test";

    fn message_writer() -> MessageWriter<Vec<u8>> {
        MessageWriter::with_capacity(Vec::new(), 256)
    }

    fn wire(writer: MessageWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.into_inner()).unwrap()
    }

    /// Splits the wire bytes into the header block (without its blank line) and the body.
    fn split_response(wire: &str) -> (&str, &str) {
        wire.split_once("\r\n\r\n").unwrap()
    }

    #[tokio::test]
    async fn raw_body_after_header_block() {
        let mut writer = message_writer();
        let mut responder = Responder::new(&mut writer, SERVER, "close");

        let mut response = responder.start_response("200 OK", [("Content-Type", "text/plain"), ("Content-Length", "11")], None).unwrap();
        response.write("hello ").await.unwrap();
        response.write(b"world").await.unwrap();
        response.close().await.unwrap();

        let wire = wire(writer);
        let (head, body) = split_response(&wire);
        let lines: Vec<&str> = head.split("\r\n").collect();

        assert_eq!(lines[0], "HTTP/1.1 200 OK");
        assert_eq!(lines[1], "Server: micro-gateway/test");
        assert!(lines[2].starts_with("Date: ") && lines[2].ends_with(" GMT"));
        assert_eq!(lines[3], "Connection: close");
        assert_eq!(&lines[4..], ["Content-Type: text/plain", "Content-Length: 11"]);
        assert_eq!(body, "hello world");
    }

    #[tokio::test]
    async fn chunked_frames_and_terminator() {
        let mut writer = message_writer();
        let mut responder = Responder::new(&mut writer, SERVER, "keep-alive");

        let mut response = responder.start_response("200 OK", [("Transfer-Encoding", "chunked")], None).unwrap();
        response.write("hello").await.unwrap();
        response.write("").await.unwrap();
        response.write(vec![b'x'; 26]).await.unwrap();
        response.close().await.unwrap();

        let wire = wire(writer);
        let (head, body) = split_response(&wire);

        assert_eq!(head.matches("Transfer-Encoding: chunked").count(), 1);
        assert!(head.contains("Connection: keep-alive"));
        assert_eq!(body, format!("5\r\nhello\r\n1A\r\n{}\r\n0\r\n\r\n", "x".repeat(26)));
    }

    #[tokio::test]
    async fn headers_are_sent_once() {
        let mut writer = message_writer();
        let mut responder = Responder::new(&mut writer, SERVER, "close");

        let mut response = responder.start_response("200 OK", Vec::<(&str, &str)>::new(), None).unwrap();
        response.send_headers().await.unwrap();
        response.send_headers().await.unwrap();
        response.write("a").await.unwrap();
        response.close().await.unwrap();
        response.close().await.unwrap();
        assert!(response.is_closed());

        let wire = wire(writer);
        assert_eq!(wire.matches("HTTP/1.1 200 OK").count(), 1);
        assert_eq!(wire.matches("Server: ").count(), 1);
        assert!(wire.ends_with("\r\n\r\na"));
    }

    #[tokio::test]
    async fn close_without_body_sends_headers() {
        let mut writer = message_writer();
        let mut responder = Responder::new(&mut writer, SERVER, "close");

        responder.start_response("204 No Content", Vec::<(&str, &str)>::new(), None).unwrap().close().await.unwrap();

        let wire = wire(writer);
        assert!(wire.starts_with("HTTP/1.1 204 No Content\r\n"));
        assert!(wire.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn empty_chunked_response_is_terminated() {
        let mut writer = message_writer();
        let mut responder = Responder::new(&mut writer, SERVER, "close");

        responder.start_response("200 OK", [("Transfer-Encoding", "chunked")], None).unwrap().close().await.unwrap();

        let wire = wire(writer);
        assert_eq!(split_response(&wire).1, "0\r\n\r\n");
    }

    #[tokio::test]
    async fn write_after_close_fails() {
        let mut writer = message_writer();
        let mut responder = Responder::new(&mut writer, SERVER, "close");

        let mut response = responder.start_response("200 OK", Vec::<(&str, &str)>::new(), None).unwrap();
        response.close().await.unwrap();
        assert!(matches!(response.write("late").await, Err(SendError::InvalidBody { .. })));
    }

    #[test]
    fn second_start_without_error_is_rejected() {
        let mut writer = message_writer();
        let mut responder = Responder::new(&mut writer, SERVER, "close");

        responder.start_response("200 OK", Vec::<(&str, &str)>::new(), None).unwrap();
        let second = responder.start_response("200 OK", Vec::<(&str, &str)>::new(), None);
        assert!(matches!(second, Err(StartError::AlreadyStarted)));
    }

    #[tokio::test]
    async fn error_restart_replaces_unsent_response() {
        let mut writer = message_writer();
        let mut responder = Responder::new(&mut writer, SERVER, "close");

        responder.start_response("200 OK", [("X-First", "1")], None).unwrap();
        let mut response = responder.start_response("500 Internal Server Error", [("X-Second", "2")], Some("boom".into())).unwrap();
        response.close().await.unwrap();

        let wire = wire(writer);
        assert!(wire.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(wire.contains("X-Second: 2"));
        assert!(!wire.contains("X-First"));
    }

    #[tokio::test]
    async fn error_restart_after_headers_returns_cause() {
        let mut writer = message_writer();
        let mut responder = Responder::new(&mut writer, SERVER, "close");

        responder.start_response("200 OK", Vec::<(&str, &str)>::new(), None).unwrap().send_headers().await.unwrap();
        assert!(responder.headers_sent());

        let result = responder.start_response("500 Internal Server Error", Vec::<(&str, &str)>::new(), Some("boom".into()));
        let cause = result.unwrap_err().into_cause().unwrap();
        assert_eq!(cause.to_string(), "boom");
    }

    #[test]
    fn invalid_input_leaves_responder_idle() {
        let mut writer = message_writer();
        let mut responder = Responder::new(&mut writer, SERVER, "close");

        assert!(matches!(responder.start_response("OK", Vec::<(&str, &str)>::new(), None), Err(StartError::InvalidStatus { .. })));
        assert!(!responder.is_started());
        assert!(responder.response().is_none());
    }
}
