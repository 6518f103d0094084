//! Streaming request bodies.
//!
//! [`RequestBody`] reads payload items straight from the connection's framed reader as the
//! application polls it, so a large upload is never buffered as a whole. It borrows the
//! reader for one exchange; before the next request can be read the remainder of the body
//! must be drained, which the session does once the application returns.

mod req_body;

pub use req_body::RequestBody;
