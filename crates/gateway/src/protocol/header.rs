//! Stateless helpers for interpreting HTTP header fields.
//!
//! These cover the pieces of header semantics the gateway needs on both sides of an
//! exchange: recognising connection-scoped (hop-by-hop) fields, collapsing obsolete
//! line folding, rendering the `Date` value, and mapping request header names and
//! addresses into request-context form.

use std::borrow::Cow;
use std::time::SystemTime;

use once_cell::sync::Lazy;
use regex::Regex;

/// Header fields that only make sense for a single transport connection (RFC 7230 section 6.1).
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// An optional CRLF followed by a run of spaces or tabs.
static FOLDING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\r\n)?[ \t]+").expect("folding pattern is valid"));

/// A CRLF followed by a run of spaces or tabs, and nothing else.
static LINE_FOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n[ \t]+").expect("line fold pattern is valid"));

/// Returns true if `name` is a hop-by-hop header. Comparison ignores ASCII case and
/// surrounding whitespace.
pub fn is_hop_by_hop(name: &str) -> bool {
    let name = name.trim();
    HOP_BY_HOP_HEADERS.iter().any(|hop| hop.eq_ignore_ascii_case(name))
}

/// Collapses obsolete line folding (and any other space/tab run) into a single space.
pub fn normalize_folding(text: &str) -> Cow<'_, str> {
    FOLDING.replace_all(text, " ")
}

/// Replaces each obsolete line fold with a single space and leaves every other
/// space or tab untouched, so values such as entity tags and cookies keep their bytes.
pub fn unfold_lines(text: &str) -> Cow<'_, str> {
    LINE_FOLD.replace_all(text, " ")
}

/// Renders `now` in the IMF-fixdate form used by the `Date` header,
/// e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(now: SystemTime) -> String {
    httpdate::fmt_http_date(now)
}

/// Maps a request header name to its request-context key: `User-Agent` becomes `HTTP_USER_AGENT`.
pub fn context_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len() + 5);
    key.push_str("HTTP_");
    key.extend(name.trim().chars().map(|c| if c == '-' { '_' } else { c.to_ascii_uppercase() }));
    key
}

/// Splits `addr` on its last colon into host and port. A missing port yields an empty string.
pub fn split_host_port(addr: &str) -> (&str, &str) {
    addr.rsplit_once(':').unwrap_or((addr, ""))
}

/// Picks the hop closest to the server from an `X-Forwarded-For` value.
pub fn last_forwarded_hop(forwarded_for: &str) -> &str {
    forwarded_for.rsplit(',').next().unwrap_or(forwarded_for).trim()
}
