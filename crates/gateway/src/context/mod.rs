//! The per-request context handed to applications.
//!
//! A [`RequestContext`] pairs a few typed gateway entries (URL scheme, the streaming input
//! body, an error stream, concurrency flags) with an ordered map of CGI-style string
//! variables: the fixed set named in [`keys`] followed by one `HTTP_<NAME>` entry per
//! request header. It is built fresh for every request by [`ContextBuilder`] from the
//! session's [`ContextDefaults`].

mod builder;
mod error_stream;
pub mod keys;

pub use builder::ContextBuilder;
pub use error_stream::ErrorStream;

use indexmap::IndexMap;

use crate::config::GatewayConfig;
use crate::protocol::body::RequestBody;

/// The gateway interface version reported to applications.
pub const INTERFACE_VERSION: (u8, u8) = (1, 0);

/// Context entries that are the same for every request on a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextDefaults {
    pub url_scheme: String,
    pub script_name: String,
    pub server_software: String,
    pub multithread: bool,
    pub multiprocess: bool,
    pub run_once: bool,
}

impl From<&GatewayConfig> for ContextDefaults {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            url_scheme: config.url_scheme.clone(),
            script_name: config.script_name.clone(),
            server_software: config.server_software.clone(),
            multithread: config.multithread,
            // debug mode runs a single worker
            multiprocess: !config.debug,
            run_once: config.run_once,
        }
    }
}

impl Default for ContextDefaults {
    fn default() -> Self {
        Self::from(&GatewayConfig::default())
    }
}

#[derive(Debug)]
pub struct RequestContext<'conn, R> {
    url_scheme: String,
    input: RequestBody<'conn, R>,
    errors: ErrorStream,
    multithread: bool,
    multiprocess: bool,
    run_once: bool,
    vars: IndexMap<String, String>,
}

impl<'conn, R> RequestContext<'conn, R> {
    pub(crate) fn new(defaults: &ContextDefaults, input: RequestBody<'conn, R>, vars: IndexMap<String, String>) -> Self {
        Self {
            url_scheme: defaults.url_scheme.clone(),
            input,
            errors: ErrorStream::new(),
            multithread: defaults.multithread,
            multiprocess: defaults.multiprocess,
            run_once: defaults.run_once,
            vars,
        }
    }

    pub fn url_scheme(&self) -> &str {
        &self.url_scheme
    }

    pub fn input(&self) -> &RequestBody<'conn, R> {
        &self.input
    }

    /// The request body, read on demand from the connection.
    pub fn input_mut(&mut self) -> &mut RequestBody<'conn, R> {
        &mut self.input
    }

    /// Sink for application diagnostics; each line is logged at error level.
    pub fn errors(&mut self) -> &mut ErrorStream {
        &mut self.errors
    }

    pub fn version(&self) -> (u8, u8) {
        INTERFACE_VERSION
    }

    pub fn multithread(&self) -> bool {
        self.multithread
    }

    /// True unless the gateway runs in single-worker debug mode.
    pub fn multiprocess(&self) -> bool {
        self.multiprocess
    }

    pub fn run_once(&self) -> bool {
        self.run_once
    }

    /// Looks up a CGI-style variable such as `PATH_INFO` or `HTTP_USER_AGENT`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// All CGI-style variables in insertion order.
    pub fn vars(&self) -> &IndexMap<String, String> {
        &self.vars
    }

    pub fn method(&self) -> &str {
        self.get(keys::REQUEST_METHOD).unwrap_or_default()
    }

    pub fn path_info(&self) -> &str {
        self.get(keys::PATH_INFO).unwrap_or_default()
    }

    pub fn query_string(&self) -> &str {
        self.get(keys::QUERY_STRING).unwrap_or_default()
    }
}
