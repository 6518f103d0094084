//! Parsed HTTP request head.
//!
//! [`RequestHead`] is what the request decoder produces for every request line and header
//! block. Unlike `http::HeaderMap` it keeps the header list exactly as received: original
//! name casing, original order, duplicates preserved.

use http::{Method, Version};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    method: Method,
    path: String,
    query: String,
    version: Version,
    headers: Vec<(String, String)>,
}

impl RequestHead {
    pub fn new(method: Method, target: &str, version: Version, headers: Vec<(String, String)>) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Self { method, path: path.to_owned(), query: query.to_owned(), version, headers }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The raw, still percent-encoded request path without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The query string without the leading `?`, empty if absent.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// The version as it appears on the request line, e.g. `HTTP/1.1`.
    pub fn version_str(&self) -> &'static str {
        match self.version {
            Version::HTTP_09 => "HTTP/0.9",
            Version::HTTP_10 => "HTTP/1.0",
            Version::HTTP_2 => "HTTP/2.0",
            Version::HTTP_3 => "HTTP/3.0",
            _ => "HTTP/1.1",
        }
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The last value received for `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().rev().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    /// Whether the client asked for the connection to end after this exchange.
    ///
    /// An explicit `close` token always wins. Otherwise HTTP/1.1 stays open and HTTP/1.0
    /// stays open only when the client sent `keep-alive`.
    pub fn should_close(&self) -> bool {
        let mut keep_alive = false;
        let tokens = self
            .headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("connection"))
            .flat_map(|(_, v)| v.split(','))
            .map(str::trim);

        for token in tokens {
            if token.eq_ignore_ascii_case("close") {
                return true;
            }
            if token.eq_ignore_ascii_case("keep-alive") {
                keep_alive = true;
            }
        }

        self.version < Version::HTTP_11 && !keep_alive
    }
}
