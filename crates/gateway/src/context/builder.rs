use indexmap::IndexMap;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::context::{ContextDefaults, RequestContext, keys};
use crate::protocol::body::RequestBody;
use crate::protocol::header::{context_key, last_forwarded_hop, split_host_port};
use crate::protocol::{RequestHead, SendError};

const CONTINUE_RESPONSE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";
const DEFAULT_CLIENT_ADDR: &str = "127.0.0.1";

/// Builds the [`RequestContext`] for one request.
#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder<'a> {
    defaults: &'a ContextDefaults,
    client_addr: Option<&'a str>,
    server_addr: Option<&'a str>,
}

/// The headers the builder interprets itself. Later duplicates override earlier ones.
#[derive(Debug, Default)]
struct SpecialHeaders<'h> {
    expect_continue: bool,
    forwarded_for: Option<&'h str>,
    host: Option<&'h str>,
    script_name: Option<&'h str>,
    content_type: &'h str,
    content_length: &'h str,
}

impl<'h> SpecialHeaders<'h> {
    fn scan(head: &'h RequestHead) -> Self {
        let mut special = Self::default();
        for (name, value) in head.headers() {
            let value = value.as_str();
            match name.to_ascii_lowercase().as_str() {
                "expect" => special.expect_continue = value.trim().eq_ignore_ascii_case("100-continue"),
                "x-forwarded-for" => special.forwarded_for = Some(value),
                "host" => special.host = Some(value),
                "script-name" | "script_name" => special.script_name = Some(value),
                "content-type" => special.content_type = value,
                "content-length" => special.content_length = value,
                _ => {}
            }
        }
        special
    }
}

impl<'a> ContextBuilder<'a> {
    pub fn new(defaults: &'a ContextDefaults) -> Self {
        Self { defaults, client_addr: None, server_addr: None }
    }

    /// The peer address of the connection, `host:port`.
    pub fn with_client_addr(mut self, client_addr: Option<&'a str>) -> Self {
        self.client_addr = client_addr;
        self
    }

    /// The local address the connection was accepted on, `host:port`.
    pub fn with_server_addr(mut self, server_addr: Option<&'a str>) -> Self {
        self.server_addr = server_addr;
        self
    }

    /// Builds the context for `head`, answering `Expect: 100-continue` on `transport` first.
    ///
    /// # Errors
    ///
    /// Returns `SendError` if the interim `100 Continue` response cannot be written.
    pub async fn build<'conn, R, W>(
        &self,
        head: &RequestHead,
        input: RequestBody<'conn, R>,
        transport: &mut W,
    ) -> Result<RequestContext<'conn, R>, SendError>
    where
        W: AsyncWrite + Unpin,
    {
        let special = SpecialHeaders::scan(head);

        if special.expect_continue {
            transport.write_all(CONTINUE_RESPONSE).await?;
            transport.flush().await?;
            info!("receive expect request header, sent continue response");
        }

        let vars = self.vars(head, &special);
        Ok(RequestContext::new(self.defaults, input, vars))
    }

    fn vars(&self, head: &RequestHead, special: &SpecialHeaders<'_>) -> IndexMap<String, String> {
        let forwarded = special.forwarded_for.map(last_forwarded_hop);
        let remote = forwarded.or(self.client_addr).unwrap_or(DEFAULT_CLIENT_ADDR);
        let (remote_addr, remote_port) = split_host_port(remote);

        let server = self.server_addr.or(special.host).unwrap_or_default();
        let (server_name, server_port) = split_host_port(server);

        let script_name = special.script_name.unwrap_or(self.defaults.script_name.as_str());
        let path_info = path_info(head.path(), script_name);

        let mut vars = IndexMap::with_capacity(13 + head.headers().len());
        let mut set = |key: &str, value: &str| {
            vars.insert(key.to_owned(), value.to_owned());
        };
        set(keys::SCRIPT_NAME, script_name);
        set(keys::SERVER_SOFTWARE, &self.defaults.server_software);
        set(keys::REQUEST_METHOD, head.method().as_str());
        set(keys::PATH_INFO, &path_info);
        set(keys::QUERY_STRING, head.query());
        set(keys::RAW_URI, head.path());
        set(keys::CONTENT_TYPE, special.content_type);
        set(keys::CONTENT_LENGTH, special.content_length);
        set(keys::REMOTE_ADDR, remote_addr);
        set(keys::REMOTE_PORT, remote_port);
        set(keys::SERVER_NAME, server_name);
        set(keys::SERVER_PORT, server_port);
        set(keys::SERVER_PROTOCOL, head.version_str());

        for (name, value) in head.headers() {
            let key = context_key(name);
            if key != "HTTP_CONTENT_TYPE" && key != "HTTP_CONTENT_LENGTH" {
                vars.insert(key, value.clone());
            }
        }

        debug!(remote_addr = remote_addr, path_info = %path_info, "built request context");
        vars
    }
}

/// Everything after the first occurrence of `script_name` in `path`, percent-decoded.
/// The whole path is used when the script name is empty or absent from it.
fn path_info(path: &str, script_name: &str) -> String {
    let rest = if script_name.is_empty() { path } else { path.split_once(script_name).map_or(path, |(_, rest)| rest) };
    String::from_utf8_lossy(&urlencoding::decode_binary(rest.as_bytes())).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::RequestReader;
    use crate::context::keys::*;
    use indoc::indoc;

    async fn build_vars(raw: &'static str, builder: ContextBuilder<'_>) -> (IndexMap<String, String>, Vec<u8>) {
        let mut reader = RequestReader::with_capacity(raw.as_bytes(), 1024);
        let request = reader.next_request().await.unwrap().unwrap();
        let mut transport = Vec::new();
        let context = builder.build(&request.head, request.body, &mut transport).await.unwrap();
        (context.vars().clone(), transport)
    }

    #[test]
    fn path_info_splits_on_script_name() {
        assert_eq!(path_info("/app/api/users", "/app"), "/api/users");
        assert_eq!(path_info("/app/api/users", ""), "/app/api/users");
        assert_eq!(path_info("/other/users", "/app"), "/other/users");
        assert_eq!(path_info("/x/app/y", "/app"), "/y");
        assert_eq!(path_info("/app/caf%C3%A9%20menu", "/app"), "/café menu");
    }

    #[tokio::test]
    async fn client_address_without_forwarding() {
        let defaults = ContextDefaults::default();
        let builder = ContextBuilder::new(&defaults).with_client_addr(Some("192.168.1.5:54321"));
        let (vars, transport) = build_vars("GET / HTTP/1.1\r\n\r\n", builder).await;

        assert_eq!(vars[REMOTE_ADDR], "192.168.1.5");
        assert_eq!(vars[REMOTE_PORT], "54321");
        assert!(transport.is_empty());
    }

    #[tokio::test]
    async fn forwarded_for_takes_last_hop() {
        let defaults = ContextDefaults::default();
        let builder = ContextBuilder::new(&defaults).with_client_addr(Some("10.1.1.1:4000"));
        let raw = "GET / HTTP/1.1\r\nX-Forwarded-For: 10.0.0.1, 10.0.0.2, 203.0.113.5\r\n\r\n";
        let (vars, _) = build_vars(raw, builder).await;

        assert_eq!(vars[REMOTE_ADDR], "203.0.113.5");
        assert_eq!(vars[REMOTE_PORT], "");
        assert_eq!(vars["HTTP_X_FORWARDED_FOR"], "10.0.0.1, 10.0.0.2, 203.0.113.5");
    }

    #[tokio::test]
    async fn missing_client_address_defaults_to_loopback() {
        let defaults = ContextDefaults::default();
        let (vars, _) = build_vars("GET / HTTP/1.1\r\n\r\n", ContextBuilder::new(&defaults)).await;

        assert_eq!(vars[REMOTE_ADDR], "127.0.0.1");
        assert_eq!(vars[REMOTE_PORT], "");
    }

    #[tokio::test]
    async fn server_address_and_host_fallback() {
        let defaults = ContextDefaults::default();
        let raw = "GET / HTTP/1.1\r\nHost: example.com:8080\r\n\r\n";

        let builder = ContextBuilder::new(&defaults).with_server_addr(Some("0.0.0.0:9000"));
        let (vars, _) = build_vars(raw, builder).await;
        assert_eq!((vars[SERVER_NAME].as_str(), vars[SERVER_PORT].as_str()), ("0.0.0.0", "9000"));

        let (vars, _) = build_vars(raw, ContextBuilder::new(&defaults)).await;
        assert_eq!((vars[SERVER_NAME].as_str(), vars[SERVER_PORT].as_str()), ("example.com", "8080"));
    }

    #[tokio::test]
    async fn full_variable_set() {
        let defaults = ContextDefaults { script_name: "/app".to_owned(), ..ContextDefaults::default() };
        let raw = indoc! {"
            POST /app/api/users?page=2 HTTP/1.0\r
            Content-Type: application/json\r
            Content-Length: 2\r
            User-Agent: curl/8.0\r
            Accept: text/html\r
            accept: application/json\r
            \r
            {}"};
        let (vars, _) = build_vars(raw, ContextBuilder::new(&defaults)).await;

        assert_eq!(vars[SCRIPT_NAME], "/app");
        assert_eq!(vars[SERVER_SOFTWARE], defaults.server_software);
        assert_eq!(vars[REQUEST_METHOD], "POST");
        assert_eq!(vars[PATH_INFO], "/api/users");
        assert_eq!(vars[QUERY_STRING], "page=2");
        assert_eq!(vars[RAW_URI], "/app/api/users");
        assert_eq!(vars[CONTENT_TYPE], "application/json");
        assert_eq!(vars[CONTENT_LENGTH], "2");
        assert_eq!(vars[SERVER_PROTOCOL], "HTTP/1.0");
        assert_eq!(vars["HTTP_USER_AGENT"], "curl/8.0");
        assert_eq!(vars["HTTP_ACCEPT"], "application/json");
        assert!(!vars.contains_key("HTTP_CONTENT_TYPE"));
        assert!(!vars.contains_key("HTTP_CONTENT_LENGTH"));

        let order: Vec<&str> = vars.keys().take(3).map(String::as_str).collect();
        assert_eq!(order, [SCRIPT_NAME, SERVER_SOFTWARE, REQUEST_METHOD]);
    }

    #[tokio::test]
    async fn script_name_header_overrides_default() {
        let defaults = ContextDefaults { script_name: "/app".to_owned(), ..ContextDefaults::default() };

        let (vars, _) = build_vars("GET /mnt/x HTTP/1.1\r\nScript-Name: /mnt\r\n\r\n", ContextBuilder::new(&defaults)).await;
        assert_eq!((vars[SCRIPT_NAME].as_str(), vars[PATH_INFO].as_str()), ("/mnt", "/x"));

        let (vars, _) = build_vars("GET /mnt/y HTTP/1.1\r\nScript_Name: /mnt\r\n\r\n", ContextBuilder::new(&defaults)).await;
        assert_eq!((vars[SCRIPT_NAME].as_str(), vars[PATH_INFO].as_str()), ("/mnt", "/y"));
    }

    #[tokio::test]
    async fn expect_continue_is_answered() {
        let defaults = ContextDefaults::default();
        let raw = "POST /upload HTTP/1.1\r\nExpect: 100-Continue\r\nContent-Length: 1\r\n\r\nx";
        let (vars, transport) = build_vars(raw, ContextBuilder::new(&defaults)).await;

        assert_eq!(transport, b"HTTP/1.1 100 Continue\r\n\r\n");
        assert_eq!(vars["HTTP_EXPECT"], "100-Continue");
    }

    #[tokio::test]
    async fn typed_entries_follow_defaults() {
        let config = crate::config::GatewayConfig::default().with_debug(true).with_url_scheme("https");
        let defaults = ContextDefaults::from(&config);

        let mut reader = RequestReader::with_capacity("GET / HTTP/1.1\r\n\r\n".as_bytes(), 1024);
        let request = reader.next_request().await.unwrap().unwrap();
        let context = ContextBuilder::new(&defaults).build(&request.head, request.body, &mut Vec::<u8>::new()).await.unwrap();

        assert_eq!(context.url_scheme(), "https");
        assert_eq!(context.version(), (1, 0));
        assert!(!context.multiprocess());
        assert!(!context.multithread());
        assert!(!context.run_once());
    }
}
