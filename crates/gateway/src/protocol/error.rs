use std::error::Error;
use std::io;
use thiserror::Error;

/// Boxed error raised by an application while handling a request.
pub type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },

    #[error("start response error: {source}")]
    StartError {
        #[from]
        source: StartError,
    },

    #[error("application error after response headers were sent: {cause}")]
    Application { cause: BoxError },
}

impl GatewayError {
    /// Returns true when the underlying transport failed because the peer reset the connection.
    pub fn is_connection_reset(&self) -> bool {
        let io_error = match self {
            GatewayError::RequestError { source: ParseError::Io { source } }
            | GatewayError::ResponseError { source: SendError::Io { source } } => source,
            _ => return false,
        };
        io_error.kind() == io::ErrorKind::ConnectionReset
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http uri")]
    InvalidUri,

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Failures of the response-start contract.
///
/// `AlreadyStarted` is a programming error in the application. `AlreadyResponded`
/// hands the application's own error back because the status line is already on the wire.
#[derive(Error, Debug)]
pub enum StartError {
    #[error("response headers already set")]
    AlreadyStarted,

    #[error("response headers already sent: {cause}")]
    AlreadyResponded { cause: BoxError },

    #[error("invalid status line: {reason}")]
    InvalidStatus { reason: String },

    #[error("invalid header type: {reason}")]
    InvalidHeaderType { reason: String },

    #[error("invalid header value: {reason}")]
    InvalidHeaderValue { reason: String },
}

impl StartError {
    pub fn invalid_status<S: ToString>(str: S) -> Self {
        Self::InvalidStatus { reason: str.to_string() }
    }

    pub fn invalid_header_type<S: ToString>(str: S) -> Self {
        Self::InvalidHeaderType { reason: str.to_string() }
    }

    pub fn invalid_header_value<S: ToString>(str: S) -> Self {
        Self::InvalidHeaderValue { reason: str.to_string() }
    }

    /// Recovers the application error carried by `AlreadyResponded`.
    pub fn into_cause(self) -> Option<BoxError> {
        match self {
            StartError::AlreadyResponded { cause } => Some(cause),
            _ => None,
        }
    }
}
