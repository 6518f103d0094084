//! Names of the CGI-style variables in a [`RequestContext`](super::RequestContext).

pub const SCRIPT_NAME: &str = "SCRIPT_NAME";
pub const SERVER_SOFTWARE: &str = "SERVER_SOFTWARE";
pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
/// Percent-decoded path below the script name.
pub const PATH_INFO: &str = "PATH_INFO";
pub const QUERY_STRING: &str = "QUERY_STRING";
/// Request path exactly as received.
pub const RAW_URI: &str = "RAW_URI";
pub const CONTENT_TYPE: &str = "CONTENT_TYPE";
pub const CONTENT_LENGTH: &str = "CONTENT_LENGTH";
pub const REMOTE_ADDR: &str = "REMOTE_ADDR";
pub const REMOTE_PORT: &str = "REMOTE_PORT";
pub const SERVER_NAME: &str = "SERVER_NAME";
pub const SERVER_PORT: &str = "SERVER_PORT";
pub const SERVER_PROTOCOL: &str = "SERVER_PROTOCOL";
