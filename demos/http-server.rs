// © 2019 3D Robotics. License: Apache-2.0
//! Embedding demo: a minimal `hyper`/`tokio` server that reads a JSON
//! manifest and streams the resulting archive as a chunked
//! `application/zip` response body. Not part of the published crate —
//! demonstrates the HTTP embedding path the library itself stays out of.

use std::convert::Infallible;
use std::net::SocketAddr;

use bytes::Bytes;
use futures::StreamExt;
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::net::TcpListener;

use zipflow::config::{init_logging, EncoderOptions};
use zipflow::encoder::build_stream;
use zipflow::manifest::{Entry, Manifest};
use zipflow::source::SourceDescriptor;

#[derive(Deserialize)]
struct DemoManifest {
    entries: Vec<DemoEntry>,
}

#[derive(Deserialize)]
struct DemoEntry {
    path: String,
    bytes: u64,
}

fn demo_manifest_json() -> &'static str {
    r#"{
        "entries": [
            { "path": "hello.txt", "bytes": 1024 },
            { "path": "world.txt", "bytes": 2048 }
        ]
    }"#
}

async fn handler(
    req: Request<hyper::body::Incoming>,
) -> Result<Response<UnsyncBoxBody<Bytes, std::io::Error>>, Infallible> {
    log::info!("Demo server got a request for {}", req.uri());

    let parsed: DemoManifest = match serde_json::from_str(demo_manifest_json()) {
        Ok(m) => m,
        Err(e) => {
            log::error!("invalid demo manifest: {}", e);
            return Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(empty_body())
                .unwrap());
        }
    };

    let mut manifest = Manifest::create();
    for entry in parsed.entries {
        manifest = manifest.append(Entry::new(SourceDescriptor::Random(entry.bytes), entry.path));
    }

    let byte_stream = build_stream(manifest, EncoderOptions::default()).map(|chunk| {
        chunk
            .map(Frame::data)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    });

    let body = BodyExt::boxed_unsync(StreamBody::new(byte_stream));

    Ok(Response::builder()
        .header("Content-Type", "application/zip")
        .header("X-Zip-Stream", "true")
        .body(body)
        .unwrap())
}

fn empty_body() -> UnsyncBoxBody<Bytes, std::io::Error> {
    http_body_util::Empty::new().map_err(|never: std::convert::Infallible| match never {}).boxed_unsync()
}

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_logging();

    let addr = SocketAddr::from(([127, 0, 0, 1], 3001));
    let listener = TcpListener::bind(addr).await?;
    log::info!("listening on {}", addr);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);

        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new().serve_connection(io, service_fn(handler)).await {
                log::error!("error serving connection: {:?}", err);
            }
        });
    }
}
