// © 2019 3D Robotics. License: Apache-2.0
use std::{
    error::Error,
    fmt::{self, Display},
};

/// Helper for displaying errors with their sources
pub struct Report<T>(pub T);
impl<T: Error> Display for Report<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut error: &dyn Error = &self.0;

        write!(f, "{}", error)?;

        while let Some(source) = error.source() {
            write!(f, "\n  : {source}")?;
            error = source;
        }

        Ok(())
    }
}

/// Why a single entry failed validation (§7 "Manifest errors"). Timestamp
/// UTC-ness and method validity are enforced by their types (`DateTime<Utc>`,
/// the `Method` enum) rather than checked here — there is no runtime state
/// that could make either invalid once constructed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error("entry source is missing or invalid")]
    InvalidSource,
    #[error("entry path is missing")]
    MissingPath,
    #[error("entry attributes are invalid")]
    InvalidAttributes,
}

/// Why a manifest as a whole is invalid.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("manifest has no entries")]
    EmptyManifest,
    #[error("invalid entry: {0}")]
    Entry(#[from] EntryError),
}

/// Errors raised while building or reading from a [`crate::source::Source`]
/// (§7 "Source build errors" / "Source read errors").
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("unknown source kind")]
    UnknownKind,
    #[error("http status {0} fetching {1}")]
    HttpStatus(reqwest::StatusCode, String),
    #[error("unsupported URL scheme (only http/https are supported): {0}")]
    UnsupportedScheme(String),
    #[error("file not found: {0}")]
    FileNotFound(std::path::PathBuf),
    #[error("dynamic source function returned an error: {0}")]
    DynamicBuild(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("connection closed before the response completed")]
    Truncated,
    #[error("url reader task terminated unexpectedly")]
    ReaderClosed,
}

/// The top-level error an `Encoder` stream fails with (§7). There is no
/// compressor error variant: `Compressor::feed`/`close` are infallible by
/// construction (§4.2) — a real `flate2` failure is treated as a bug, not a
/// recoverable condition, same as the teacher's `.expect(...)` on deflate
/// calls.
#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("invalid manifest: {0}")]
    Manifest(#[from] ManifestError),
    #[error("entry {path:?} failed: {source}")]
    Source { path: String, #[source] source: SourceError },
}
