// © 2019 3D Robotics. License: Apache-2.0
//! Streams a single ZIP64 archive from an ordered [`manifest::Manifest`] of
//! entries, lazily, without buffering any entry's payload or the archive as
//! a whole. Entry payloads come from local files, HTTP(S) downloads,
//! caller-supplied generators, or random bytes.
//!
//! The entry point is [`encoder::build_stream`]:
//!
//! ```no_run
//! use zipflow::manifest::{Entry, Manifest};
//! use zipflow::source::SourceDescriptor;
//! use zipflow::{config::EncoderOptions, encoder::build_stream};
//!
//! # async fn run() {
//! let manifest = Manifest::create().append(Entry::new(SourceDescriptor::Random(1024), "a.bin"));
//! let stream = build_stream(manifest, EncoderOptions::default());
//! # }
//! ```

pub mod compressor;
pub mod config;
pub mod encoder;
pub mod error;
pub mod events;
pub mod field_encoding;
pub mod manifest;
pub mod source;
