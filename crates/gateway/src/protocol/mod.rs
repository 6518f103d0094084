//! Core protocol types shared by the codecs, the request-context builder and the session.
//!
//! - **Message Handling** ([`message`]): [`Message`], [`PayloadItem`] and [`PayloadSize`]
//! - **Requests** ([`request`]): [`RequestHead`], the parsed request line and header list
//! - **Responses** ([`response`]): [`ResponseHead`], [`ResponsePreamble`] and [`ConnectionPolicy`]
//! - **Headers** ([`header`]): hop-by-hop classification, folding, dates and address helpers
//! - **Body Streaming** ([`body`]): [`body::RequestBody`], the lazily read request payload
//! - **Error Handling** ([`error`]): [`GatewayError`], [`ParseError`], [`SendError`], [`StartError`]

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::RequestHead;

mod response;
pub use response::ConnectionPolicy;
pub use response::ResponseHead;
pub use response::ResponsePreamble;

mod error;
pub use error::BoxError;
pub use error::GatewayError;
pub use error::ParseError;
pub use error::SendError;
pub use error::StartError;

pub mod body;
pub mod header;
