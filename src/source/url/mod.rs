// © 2019 3D Robotics. License: Apache-2.0
//! HTTP(S) payload source: one [`buffer::BufferHandle`] plus one
//! [`reader::ConnectionState`] watch channel per source, driven by a spawned
//! Reader task (§4.4).

mod buffer;
mod reader;

use tokio::sync::watch;
use url::Url;

use super::{ReadOutcome, Source};
use crate::error::SourceError;
use reader::ConnectionState;

const DEFAULT_CAPACITY: usize = 1024 * 1024;

#[derive(Clone)]
pub struct UrlOptions {
    /// Backpressure capacity of the underlying Buffer, in bytes.
    pub capacity: usize,
}

impl Default for UrlOptions {
    fn default() -> Self {
        UrlOptions { capacity: DEFAULT_CAPACITY }
    }
}

#[derive(Debug)]
pub struct UrlSource {
    buffer: buffer::BufferHandle,
    state: watch::Receiver<ConnectionState>,
}

impl UrlSource {
    /// Spawns the Buffer and Reader actors and waits for the connection
    /// outcome to leave `Connecting` before returning, so a bad status or
    /// unreachable host surfaces as a build error rather than a later read
    /// error.
    pub async fn connect(url: Url, opts: UrlOptions) -> Result<Self, SourceError> {
        let buffer = buffer::spawn(opts.capacity);
        let mut state = reader::spawn(url, buffer.clone());

        loop {
            match &*state.borrow() {
                ConnectionState::Connecting => {}
                ConnectionState::Connected => break,
                ConnectionState::Failed(e) => return Err(clone_error(e)),
            }
            if state.changed().await.is_err() {
                return Err(SourceError::ReaderClosed);
            }
        }

        Ok(UrlSource { buffer, state })
    }
}

fn clone_error(e: &SourceError) -> SourceError {
    match e {
        SourceError::UnknownKind => SourceError::UnknownKind,
        SourceError::HttpStatus(status, url) => SourceError::HttpStatus(*status, url.clone()),
        SourceError::UnsupportedScheme(s) => SourceError::UnsupportedScheme(s.clone()),
        SourceError::FileNotFound(p) => SourceError::FileNotFound(p.clone()),
        SourceError::DynamicBuild(s) => SourceError::DynamicBuild(s.clone()),
        SourceError::Truncated => SourceError::Truncated,
        SourceError::ReaderClosed => SourceError::ReaderClosed,
        SourceError::Io(e) => SourceError::Io(std::io::Error::new(e.kind(), e.to_string())),
        SourceError::Http(_) => SourceError::ReaderClosed,
    }
}

#[async_trait::async_trait]
impl Source for UrlSource {
    async fn read(&mut self) -> Result<ReadOutcome, SourceError> {
        loop {
            if let ConnectionState::Failed(e) = &*self.state.borrow() {
                return Err(clone_error(e));
            }

            match self.buffer.read().await {
                ReadOutcome::Chunk(chunk) if !chunk.is_empty() => return Ok(ReadOutcome::Chunk(chunk)),
                ReadOutcome::Eof => return Ok(ReadOutcome::Eof),
                ReadOutcome::Chunk(_) => {
                    // nothing queued yet and not finished: wait for data or a
                    // state change before polling again.
                    tokio::select! {
                        _ = self.buffer.notified() => {}
                        _ = self.state.changed() => {}
                    }
                }
            }
        }
    }
}
