//! Connection handling: reading requests and writing responses over one transport.
//!
//! # Components
//!
//! - [`Session`]: serves the requests of one connection in order, deciding after each
//!   exchange whether the connection is reused
//! - [`Exchange`]: one request's context together with its [`Responder`]
//! - [`Responder`] / [`ResponseWriter`]: the response-start contract and the body writer
//! - [`RequestReader`]: pulls parsed requests off the read half
//! - [`MessageWriter`]: buffers encoded response messages and flushes them to the write half
//!
//! Everything runs inside the caller's task; the session spawns nothing.

mod message_writer;
mod request_reader;
mod responder;
mod session;

pub use message_writer::MessageWriter;
pub use request_reader::{ParsedRequest, RequestReader};
pub use responder::{Responder, ResponseWriter};
pub use session::{Exchange, Session};
