use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use crate::config::GatewayConfig;
use crate::connection::{MessageWriter, ParsedRequest, RequestReader, Responder};
use crate::context::{ContextBuilder, ContextDefaults, RequestContext};
use crate::handler::Application;
use crate::protocol::{BoxError, ConnectionPolicy, GatewayError, ParseError};

const INTERNAL_ERROR_BODY: &str = "Internal Server Error\n";
const BAD_REQUEST_BODY: &str = "Bad Request\n";

/// Serves the requests of one connection, strictly one after another.
///
/// Each [`read`](Session::read) yields an [`Exchange`]: the request context plus the
/// responder for that request. Both borrow the session, so the next request cannot be read
/// before the current exchange is [finished](Exchange::finish).
#[derive(Debug)]
pub struct Session<R, W> {
    reader: RequestReader<R>,
    writer: MessageWriter<W>,
    defaults: ContextDefaults,
    policy: ConnectionPolicy,
    client_addr: Option<String>,
    server_addr: Option<String>,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, config: &GatewayConfig) -> Self {
        Self {
            reader: RequestReader::with_capacity(reader, config.read_buffer_size),
            writer: MessageWriter::with_capacity(writer, config.write_buffer_size),
            defaults: ContextDefaults::from(config),
            policy: config.connection,
            client_addr: None,
            server_addr: None,
        }
    }

    /// The peer address, `host:port`. Used for `REMOTE_ADDR` when no proxy header is present.
    pub fn with_client_addr(mut self, client_addr: impl Into<String>) -> Self {
        self.client_addr = Some(client_addr.into());
        self
    }

    /// The local address, `host:port`. Without it the `Host` header is used.
    pub fn with_server_addr(mut self, server_addr: impl Into<String>) -> Self {
        self.server_addr = Some(server_addr.into());
        self
    }

    pub fn policy(&self) -> ConnectionPolicy {
        self.policy
    }

    pub fn defaults(&self) -> &ContextDefaults {
        &self.defaults
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader.into_inner(), self.writer.into_inner())
    }

    /// Reads the next request and builds its exchange. `Ok(None)` means the peer is done.
    ///
    /// Under [`ConnectionPolicy::KeepAlive`] a connection reset by the peer also ends the
    /// stream quietly.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the request is malformed or the transport fails.
    pub async fn read(&mut self) -> Result<Option<Exchange<'_, R, W>>, GatewayError> {
        let absorbs_reset = self.policy.absorbs_reset();
        match self.read_exchange().await {
            Err(e) if absorbs_reset && e.is_connection_reset() => {
                debug!(cause = %e, "peer reset idle connection");
                Ok(None)
            }
            result => result,
        }
    }

    async fn read_exchange(&mut self) -> Result<Option<Exchange<'_, R, W>>, GatewayError> {
        let reader = &mut self.reader;
        let writer = &mut self.writer;
        let defaults = &self.defaults;
        let policy = self.policy;

        writer.reset();
        let parsed = match reader.next_request().await {
            Ok(parsed) => parsed,
            Err(e) => {
                if !matches!(e, ParseError::Io { .. }) {
                    reject(writer, &defaults.server_software, &e).await;
                }
                return Err(e.into());
            }
        };
        let Some(ParsedRequest { head, body }) = parsed else {
            return Ok(None);
        };

        let should_close = head.should_close();
        let context = ContextBuilder::new(defaults)
            .with_client_addr(self.client_addr.as_deref())
            .with_server_addr(self.server_addr.as_deref())
            .build(&head, body, writer.get_mut())
            .await?;

        let responder = Responder::new(writer, &defaults.server_software, policy.connection_header(should_close));
        Ok(Some(Exchange { context, responder, keep_alive: policy.reuses_connection(should_close) }))
    }

    /// Runs `app` for every request until the connection should end.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on malformed requests, transport failures, or an application
    /// error raised after the response headers were sent.
    pub async fn serve<A>(&mut self, app: &A) -> Result<(), GatewayError>
    where
        A: Application<R, W> + ?Sized,
    {
        loop {
            let Some(mut exchange) = self.read().await? else {
                info!("cant read more request, break this connection down");
                return Ok(());
            };

            let (context, responder) = exchange.parts();
            let result = app.call(context, responder).await;

            if !exchange.finish(result).await? {
                debug!("connection will not be reused");
                return Ok(());
            }
        }
    }
}

/// One request being served: its context and the responder for its response.
#[derive(Debug)]
pub struct Exchange<'s, R, W> {
    context: RequestContext<'s, R>,
    responder: Responder<'s, W>,
    keep_alive: bool,
}

impl<'s, R, W> Exchange<'s, R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn context(&mut self) -> &mut RequestContext<'s, R> {
        &mut self.context
    }

    pub fn responder(&mut self) -> &mut Responder<'s, W> {
        &mut self.responder
    }

    /// Both halves at once, as an application receives them.
    pub fn parts(&mut self) -> (&mut RequestContext<'s, R>, &mut Responder<'s, W>) {
        (&mut self.context, &mut self.responder)
    }

    /// Whether the connection may carry another request after this one.
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Completes the exchange after the application returned `result`.
    ///
    /// A failure before any header reached the wire is answered with a `500`, as is an
    /// application that never started a response. The unread request body is drained and
    /// the response closed. Returns whether the connection may be reused.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Application`] if the application failed after headers were
    /// sent, or another `GatewayError` if draining or writing fails.
    pub async fn finish(self, result: Result<(), BoxError>) -> Result<bool, GatewayError> {
        let Exchange { mut context, mut responder, keep_alive } = self;

        match result {
            Ok(()) if responder.is_started() => {}
            Ok(()) => {
                error!("application returned without starting a response");
                send_plain(&mut responder, "500 Internal Server Error", INTERNAL_ERROR_BODY, None).await?;
            }
            Err(cause) if responder.headers_sent() => {
                error!(cause = %cause, "application failed after response headers were sent");
                if let Some(mut response) = responder.response() {
                    response.close().await?;
                }
                return Err(GatewayError::Application { cause });
            }
            Err(cause) => {
                error!(cause = %cause, "application failed, sending internal server error");
                send_plain(&mut responder, "500 Internal Server Error", INTERNAL_ERROR_BODY, Some(cause)).await?;
            }
        }

        context.input_mut().drain().await?;

        if let Some(mut response) = responder.response() {
            response.close().await?;
        }
        Ok(keep_alive)
    }
}

/// Best-effort `400` for a request that could not be parsed.
async fn reject<W>(writer: &mut MessageWriter<W>, server: &str, cause: &ParseError)
where
    W: AsyncWrite + Unpin,
{
    warn!(cause = %cause, "can't parse request, sending bad request");
    writer.reset();

    let mut responder = Responder::new(writer, server, "close");
    if let Err(e) = send_plain(&mut responder, "400 Bad Request", BAD_REQUEST_BODY, None).await {
        warn!(cause = %e, "failed to send bad request response");
    }
}

async fn send_plain<W>(responder: &mut Responder<'_, W>, status: &str, body: &str, cause: Option<BoxError>) -> Result<(), GatewayError>
where
    W: AsyncWrite + Unpin,
{
    let length = body.len().to_string();
    let headers = [("Content-Type", "text/plain"), ("Content-Length", length.as_str())];

    let mut response = responder.start_response(status, headers, cause)?;
    response.write(body).await?;
    response.close().await?;
    Ok(())
}
