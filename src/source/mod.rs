// © 2019 3D Robotics. License: Apache-2.0
//! Where an entry's payload comes from (§4.3). A [`SourceDescriptor`] is a
//! cheap, cloneable description; [`SourceDescriptor::build`] turns it into a
//! live [`Source`] that the encoder pulls chunks from.

mod dynamic;
mod file;
mod random;
mod url;

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::SourceError;

pub use url::{UrlOptions, UrlSource};

/// One chunk pulled from a source, or end-of-payload.
pub enum ReadOutcome {
    Chunk(Bytes),
    Eof,
}

/// A live, stateful handle onto one entry's payload.
#[async_trait::async_trait]
pub trait Source: Send + std::fmt::Debug {
    /// Pull the next chunk. Never blocks indefinitely on network sources —
    /// see [`UrlSource`] for how that's reconciled with `async`.
    async fn read(&mut self) -> Result<ReadOutcome, SourceError>;
}

pub type DynFn = Arc<dyn Fn() -> Result<SourceDescriptor, SourceError> + Send + Sync>;

/// Description of where a payload comes from, cheap to store on an
/// [`crate::manifest::Entry`] and built lazily when the encoder reaches it.
#[derive(Clone)]
pub enum SourceDescriptor {
    File(PathBuf),
    Url(::url::Url, UrlOptions),
    Dynamic(DynFn),
    Random(u64),
}

impl SourceDescriptor {
    /// Cheap, synchronous validity check run at manifest-build time (§4.5);
    /// deeper failures (missing file, unreachable host) only surface once
    /// [`SourceDescriptor::build`] actually opens the source.
    pub(crate) fn validate(&self) -> Result<(), crate::error::EntryError> {
        match self {
            SourceDescriptor::File(path) if path.as_os_str().is_empty() => {
                Err(crate::error::EntryError::InvalidSource)
            }
            _ => Ok(()),
        }
    }

    pub async fn build(&self) -> Result<Box<dyn Source>, SourceError> {
        match self {
            SourceDescriptor::File(path) => Ok(Box::new(file::FileSource::open(path).await?)),
            SourceDescriptor::Url(url, opts) => {
                Ok(Box::new(UrlSource::connect(url.clone(), opts.clone()).await?))
            }
            SourceDescriptor::Dynamic(f) => {
                let resolved = f().map_err(|e| SourceError::DynamicBuild(e.to_string()))?;
                Box::pin(resolved.build()).await
            }
            SourceDescriptor::Random(byte_count) => Ok(Box::new(random::RandomSource::new(*byte_count))),
        }
    }
}
