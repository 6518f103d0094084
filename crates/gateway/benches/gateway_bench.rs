use std::hint::black_box;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use criterion::{Criterion, criterion_group, criterion_main};
use futures::executor::block_on;
use micro_gateway::codec::{RequestDecoder, ResponseEncoder};
use micro_gateway::config::GatewayConfig;
use micro_gateway::connection::{Responder, Session};
use micro_gateway::context::RequestContext;
use micro_gateway::handler::Application;
use micro_gateway::protocol::{BoxError, ConnectionPolicy, Message, PayloadItem, ResponseHead, ResponsePreamble};
use tokio_util::codec::{Decoder, Encoder};

const SIMPLE_REQUEST: &[u8] = b"GET /app/users?id=7 HTTP/1.1\r\nHost: localhost\r\nUser-Agent: bench\r\nX-Forwarded-For: 10.0.0.1, 203.0.113.5\r\n\r\n";

struct Hello;

#[async_trait]
impl Application<&'static [u8], Vec<u8>> for Hello {
    async fn call(&self, _context: &mut RequestContext<'_, &'static [u8]>, responder: &mut Responder<'_, Vec<u8>>) -> Result<(), BoxError> {
        let mut response = responder.start_response("200 OK", [("Content-Type", "text/plain"), ("Content-Length", "12")], None)?;
        response.write("Hello World!").await?;
        Ok(())
    }
}

fn bench_request_decoder(c: &mut Criterion) {
    c.bench_function("decode_simple_request", |b| {
        b.iter(|| {
            let mut decoder = RequestDecoder::new();
            let mut bytes = BytesMut::from(SIMPLE_REQUEST);
            black_box(decoder.decode(&mut bytes).unwrap());
        });
    });
}

fn bench_chunked_response_encoder(c: &mut Criterion) {
    let head = ResponseHead::new("200 OK", [("Content-Type", "text/plain"), ("Transfer-Encoding", "chunked")]).unwrap();
    let chunk = Bytes::from_static(b"Hello World!");

    c.bench_function("encode_chunked_response", |b| {
        b.iter(|| {
            let mut encoder = ResponseEncoder::new();
            let mut bytes = BytesMut::new();
            let preamble = ResponsePreamble { head: &head, server: "bench", date: "Sun, 06 Nov 1994 08:49:37 GMT", connection: "close" };
            encoder.encode(Message::<_, Bytes>::Header(preamble), &mut bytes).unwrap();
            for _ in 0..8 {
                encoder.encode(Message::<ResponsePreamble<'_>, _>::Payload(PayloadItem::Chunk(chunk.clone())), &mut bytes).unwrap();
            }
            encoder.encode(Message::<ResponsePreamble<'_>, Bytes>::Payload(PayloadItem::Eof), &mut bytes).unwrap();
            black_box(bytes);
        });
    });
}

fn bench_session(c: &mut Criterion) {
    let config = GatewayConfig::default().with_connection(ConnectionPolicy::KeepAlive).with_script_name("/app");

    c.bench_function("serve_simple_request", |b| {
        b.iter(|| {
            let mut session = Session::new(SIMPLE_REQUEST, Vec::new(), &config).with_client_addr("127.0.0.1:40000");
            block_on(session.serve(&Hello)).unwrap();
            black_box(session.into_parts());
        });
    });
}

criterion_group!(benches, bench_request_decoder, bench_chunked_response_encoder, bench_session);
criterion_main!(benches);
