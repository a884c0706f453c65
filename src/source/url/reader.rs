// © 2019 3D Robotics. License: Apache-2.0
//! The Reader actor: owns the HTTP connection lifecycle for one URL source
//! and feeds bytes into its [`super::buffer::BufferHandle`] as they arrive.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use url::Url;

use super::buffer::BufferHandle;
use crate::error::SourceError;

/// Published on a `watch` channel so `connect()`/`read()` can await the
/// earliest point at which the outcome is knowable, without a hand-rolled
/// defer queue.
#[derive(Clone, Debug)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Failed(Arc<SourceError>),
}

pub fn spawn(url: Url, buffer: BufferHandle) -> watch::Receiver<ConnectionState> {
    let (tx, rx) = watch::channel(ConnectionState::Connecting);
    tokio::spawn(run(url, buffer, tx));
    rx
}

async fn run(url: Url, buffer: BufferHandle, state: watch::Sender<ConnectionState>) {
    if url.scheme() != "http" && url.scheme() != "https" {
        let _ = state.send(ConnectionState::Failed(Arc::new(SourceError::UnsupportedScheme(
            url.scheme().to_string(),
        ))));
        return;
    }

    let response = match reqwest::get(url.clone()).await {
        Ok(resp) => resp,
        Err(e) => {
            let _ = state.send(ConnectionState::Failed(Arc::new(SourceError::Http(e))));
            return;
        }
    };

    // reqwest surfaces the status alongside the response object, before any
    // body bytes are polled — the status check happens here rather than
    // after an explicit "first chunk," the earliest point it's knowable.
    if !response.status().is_success() {
        let status = response.status();
        let _ = state.send(ConnectionState::Failed(Arc::new(SourceError::HttpStatus(
            status,
            url.to_string(),
        ))));
        return;
    }

    let _ = state.send(ConnectionState::Connected);

    let expected_len = response.content_length();
    let mut received: u64 = 0;

    let mut stream = response.bytes_stream();
    while let Some(next) = stream.next().await {
        match next {
            Ok(chunk) => {
                received += chunk.len() as u64;
                buffer.data(chunk).await;
            }
            Err(e) => {
                let _ = state.send(ConnectionState::Failed(Arc::new(SourceError::Http(e))));
                return;
            }
        }
    }

    if expected_len.is_some_and(|expected| received < expected) {
        let _ = state.send(ConnectionState::Failed(Arc::new(SourceError::Truncated)));
        return;
    }

    buffer.finish().await;
}
