//! Gateway configuration.
//!
//! [`GatewayConfig`] can be deserialized from any serde format (keys are kebab-case and
//! every field has a default), built in code with the `with_*` setters, or seeded from
//! the process environment with [`GatewayConfig::from_env`].

use std::env;

use serde::Deserialize;

use crate::protocol::ConnectionPolicy;

const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Identifies the gateway in the `Server` response header and the `SERVER_SOFTWARE` variable.
pub const SERVER_SOFTWARE: &str = concat!("micro-gateway/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GatewayConfig {
    pub url_scheme: String,
    pub script_name: String,
    pub server_software: String,
    /// Single-worker debug mode; applications are told no other process serves them.
    pub debug: bool,
    pub multithread: bool,
    pub run_once: bool,
    pub connection: ConnectionPolicy,
    pub read_buffer_size: usize,
    pub write_buffer_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url_scheme: "http".to_owned(),
            script_name: String::new(),
            server_software: SERVER_SOFTWARE.to_owned(),
            debug: false,
            multithread: false,
            run_once: false,
            connection: ConnectionPolicy::Close,
            read_buffer_size: DEFAULT_BUFFER_SIZE,
            write_buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl GatewayConfig {
    /// Defaults plus the `SCRIPT_NAME` environment variable, when set.
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Overrides fields from the process environment. Only `SCRIPT_NAME` is read.
    pub fn apply_env(mut self) -> Self {
        if let Ok(script_name) = env::var("SCRIPT_NAME") {
            self.script_name = script_name;
        }
        self
    }

    pub fn with_url_scheme(mut self, url_scheme: impl Into<String>) -> Self {
        self.url_scheme = url_scheme.into();
        self
    }

    pub fn with_script_name(mut self, script_name: impl Into<String>) -> Self {
        self.script_name = script_name.into();
        self
    }

    pub fn with_server_software(mut self, server_software: impl Into<String>) -> Self {
        self.server_software = server_software.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_multithread(mut self, multithread: bool) -> Self {
        self.multithread = multithread;
        self
    }

    pub fn with_run_once(mut self, run_once: bool) -> Self {
        self.run_once = run_once;
        self
    }

    pub fn with_connection(mut self, connection: ConnectionPolicy) -> Self {
        self.connection = connection;
        self
    }

    pub fn with_buffer_sizes(mut self, read_buffer_size: usize, write_buffer_size: usize) -> Self {
        self.read_buffer_size = read_buffer_size;
        self.write_buffer_size = write_buffer_size;
        self
    }
}
