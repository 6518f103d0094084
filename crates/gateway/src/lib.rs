//! An asynchronous gateway core that turns HTTP/1.1 requests into application calls.
//!
//! The crate sits between a byte stream and an application. For every request read off a
//! connection it builds a normalized, CGI-style [`context::RequestContext`], hands it to an
//! [`handler::Application`] together with a [`connection::Responder`], and writes the
//! application's response back with correct HTTP/1.1 framing.
//!
//! # Features
//!
//! - Asynchronous I/O over any tokio `AsyncRead`/`AsyncWrite` pair
//! - Streaming request bodies, read only as the application asks for them
//! - Chunked transfer encoding for responses, selected by the application's headers
//! - Hop-by-hop header filtering with `Connection: Upgrade` passthrough
//! - `Expect: 100-continue` handling
//! - `X-Forwarded-For` aware client addresses
//! - Close or keep-alive connection policies
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use micro_gateway::config::GatewayConfig;
//! use micro_gateway::connection::{Responder, Session};
//! use micro_gateway::context::RequestContext;
//! use micro_gateway::handler::Application;
//! use micro_gateway::protocol::BoxError;
//! use tokio::net::TcpListener;
//! use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
//!
//! struct HelloWorld;
//!
//! #[async_trait]
//! impl Application<OwnedReadHalf, OwnedWriteHalf> for HelloWorld {
//!     async fn call(
//!         &self,
//!         context: &mut RequestContext<'_, OwnedReadHalf>,
//!         responder: &mut Responder<'_, OwnedWriteHalf>,
//!     ) -> Result<(), BoxError> {
//!         let body = format!("Hello from {}\n", context.path_info());
//!         let length = body.len().to_string();
//!         let mut response = responder.start_response("200 OK", [("Content-Length", length.as_str())], None)?;
//!         response.write(body).await?;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = GatewayConfig::from_env();
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     loop {
//!         let (stream, peer) = listener.accept().await?;
//!         let config = config.clone();
//!         tokio::spawn(async move {
//!             let (reader, writer) = stream.into_split();
//!             let mut session = Session::new(reader, writer, &config).with_client_addr(peer.to_string());
//!             let _ = session.serve(&HelloWorld).await;
//!         });
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`codec`]: request decoding and response encoding on top of `tokio_util::codec`
//! - [`protocol`]: request/response heads, header helpers, body streaming and errors
//! - [`context`]: the request context and the builder that derives it from a request
//! - [`connection`]: the session loop, the responder and the buffered writer
//! - [`handler`]: the [`handler::Application`] trait
//! - [`config`]: [`config::GatewayConfig`]
//!
//! # Errors
//!
//! - [`protocol::GatewayError`]: top-level error of a session
//! - [`protocol::ParseError`]: malformed requests and read failures
//! - [`protocol::SendError`]: write failures and misuse of a closed response
//! - [`protocol::StartError`]: violations of the response-start contract
//!
//! # Limitations
//!
//! - HTTP/1.0 and HTTP/1.1 only
//! - No TLS support (use a reverse proxy for HTTPS)
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64

pub mod codec;
pub mod config;
pub mod connection;
pub mod context;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
