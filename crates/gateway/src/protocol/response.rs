//! Response head construction and the connection-header strategy.
//!
//! [`ResponseHead`] is built from the status and header list an application passes to
//! `start_response`. Construction validates every field and applies hop-by-hop filtering:
//!
//! - `Transfer-Encoding: chunked` switches the response to chunked framing and is dropped,
//!   along with any `Content-Length`
//! - `Connection: Upgrade` is kept verbatim so protocol upgrades still work
//! - every other hop-by-hop header is dropped silently
//!
//! The `Connection` line itself is owned by the gateway and decided by [`ConnectionPolicy`].

use http::HeaderName;
use serde::Deserialize;

use crate::protocol::StartError;
use crate::protocol::header::{is_hop_by_hop, unfold_lines};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    status: String,
    headers: Vec<(String, String)>,
    chunked: bool,
}

impl ResponseHead {
    /// Validates and filters an application-supplied status and header list.
    ///
    /// # Errors
    ///
    /// - [`StartError::InvalidStatus`] if the status does not start with a three digit code
    ///   or spans multiple lines
    /// - [`StartError::InvalidHeaderType`] if a header name is not text or not a legal field name,
    ///   or a header value is not text
    /// - [`StartError::InvalidHeaderValue`] if a header value still contains CR or LF after
    ///   obsolete line folds are replaced
    pub fn new<S, I, N, V>(status: S, headers: I) -> Result<Self, StartError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let status = validate_status(status.into())?;
        let mut chunked = false;
        let mut kept = Vec::new();

        for (name, value) in headers {
            let name = std::str::from_utf8(name.as_ref())
                .map_err(|_| StartError::invalid_header_type(format!("{:?} is not a string", name.as_ref())))?
                .trim();
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| StartError::invalid_header_type(format!("{name:?} is not a valid header name")))?;

            let value = std::str::from_utf8(value.as_ref())
                .map_err(|_| StartError::invalid_header_type(format!("value of {name} is not a string")))?;
            let value = unfold_lines(value);
            if value.contains(['\r', '\n']) {
                return Err(StartError::invalid_header_value(format!("value of {name} contains a line break")));
            }
            let value = value.trim();

            if is_hop_by_hop(name) {
                if name.eq_ignore_ascii_case("transfer-encoding") {
                    if value.eq_ignore_ascii_case("chunked") {
                        chunked = true;
                    }
                    continue;
                }
                if !(name.eq_ignore_ascii_case("connection") && value.eq_ignore_ascii_case("upgrade")) {
                    continue;
                }
            }

            kept.push((name.to_owned(), value.to_owned()));
        }

        if chunked {
            kept.retain(|(name, _)| !name.eq_ignore_ascii_case("content-length"));
        }

        Ok(Self { status, headers: kept, chunked })
    }

    /// The status text as given, e.g. `200 OK`.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// The retained end-to-end headers, in application order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Whether the body is sent with chunked transfer-encoding.
    pub fn is_chunked(&self) -> bool {
        self.chunked
    }
}

fn validate_status(status: String) -> Result<String, StartError> {
    let trimmed = status.trim();
    let has_code = trimmed.len() >= 3 && trimmed.as_bytes()[..3].iter().all(u8::is_ascii_digit);
    if !has_code {
        return Err(StartError::invalid_status(format!("{status:?} does not start with a status code")));
    }
    if trimmed.contains(['\r', '\n']) {
        return Err(StartError::invalid_status(format!("{status:?} contains a line break")));
    }
    Ok(trimmed.to_owned())
}

/// Everything the header encoder needs to open a response: the head plus the
/// gateway-owned `Server`, `Date` and `Connection` values.
#[derive(Debug, Clone, Copy)]
pub struct ResponsePreamble<'a> {
    pub head: &'a ResponseHead,
    pub server: &'a str,
    pub date: &'a str,
    pub connection: &'a str,
}

/// How the gateway treats the transport once a response is done.
///
/// `Close` answers every request with `Connection: close` and serves a single exchange.
/// `KeepAlive` honours the request's own close signal, reuses the connection otherwise,
/// and treats a peer reset while waiting for the next request as a normal end of stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionPolicy {
    #[default]
    Close,
    KeepAlive,
}

impl ConnectionPolicy {
    /// The `Connection` header value for a response to a request with the given close signal.
    pub fn connection_header(self, request_wants_close: bool) -> &'static str {
        match self {
            ConnectionPolicy::KeepAlive if !request_wants_close => "keep-alive",
            _ => "close",
        }
    }

    /// Whether another request may be read from the connection after this exchange.
    pub fn reuses_connection(self, request_wants_close: bool) -> bool {
        self == ConnectionPolicy::KeepAlive && !request_wants_close
    }

    /// Whether a peer reset during `read` ends the session quietly.
    pub fn absorbs_reset(self) -> bool {
        self == ConnectionPolicy::KeepAlive
    }
}
