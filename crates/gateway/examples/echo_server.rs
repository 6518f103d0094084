//! Echo server: answers every request with its context variables followed by the request body.
//!
//! ```text
//! cargo run --example echo_server
//! curl -d 'hello' http://127.0.0.1:8080/app/echo?x=1
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use micro_gateway::config::GatewayConfig;
use micro_gateway::connection::{Responder, Session};
use micro_gateway::context::RequestContext;
use micro_gateway::handler::Application;
use micro_gateway::protocol::{BoxError, ConnectionPolicy};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

struct EchoApp;

#[async_trait]
impl Application<OwnedReadHalf, OwnedWriteHalf> for EchoApp {
    async fn call(
        &self,
        context: &mut RequestContext<'_, OwnedReadHalf>,
        responder: &mut Responder<'_, OwnedWriteHalf>,
    ) -> Result<(), BoxError> {
        let mut summary = String::new();
        for (key, value) in context.vars() {
            summary.push_str(key);
            summary.push_str(": ");
            summary.push_str(value);
            summary.push('\n');
        }
        summary.push('\n');

        let mut response = responder.start_response("200 OK", [("Content-Type", "text/plain"), ("Transfer-Encoding", "chunked")], None)?;
        response.write(summary).await?;
        while let Some(chunk) = context.input_mut().read_chunk().await? {
            response.write(chunk).await?;
        }
        response.close().await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = Arc::new(GatewayConfig::from_env().with_connection(ConnectionPolicy::KeepAlive));

    info!(port = 8080, "start listening");
    let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    let app = Arc::new(EchoApp);
    loop {
        let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        let app = Arc::clone(&app);
        let config = Arc::clone(&config);
        let local_addr = tcp_stream.local_addr().map(|addr| addr.to_string()).unwrap_or_default();

        tokio::spawn(async move {
            let (reader, writer) = tcp_stream.into_split();
            let mut session = Session::new(reader, writer, &config)
                .with_client_addr(remote_addr.to_string())
                .with_server_addr(local_addr);

            match session.serve(&*app).await {
                Ok(()) => info!("finished process, connection shutdown"),
                Err(e) => error!(cause = %e, "service has error, connection shutdown"),
            }
        });
    }
}
