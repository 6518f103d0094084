//! The application interface.
//!
//! An [`Application`] receives the request context and a [`Responder`] for every request a
//! session reads. It starts the response with [`Responder::start_response`] and writes the
//! body through the returned writer. Returning an error before any header reached the wire
//! lets the session answer with a `500`.

use async_trait::async_trait;

use crate::connection::Responder;
use crate::context::RequestContext;
use crate::protocol::BoxError;

#[async_trait]
pub trait Application<R, W>: Send + Sync {
    async fn call(&self, context: &mut RequestContext<'_, R>, responder: &mut Responder<'_, W>) -> Result<(), BoxError>;
}

