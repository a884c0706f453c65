// © 2019 3D Robotics. License: Apache-2.0
//! The state machine driving one archive from a validated [`Manifest`] to a
//! lazily-pulled byte [`Stream`] (§4.6). `bytes_emitted` is the single
//! source of truth for every offset recorded in the central directory —
//! nothing is precomputed.

use async_stream::try_stream;
use bytes::Bytes;
use crc32fast::Hasher;
use futures::Stream;
use uuid::Uuid;

use crate::compressor;
use crate::config::EncoderOptions;
use crate::error::EncodeError;
use crate::events::{Event, OnError};
use crate::field_encoding::{central_file_header, data_descriptor, local_file_header, EndOfArchive};
use crate::manifest::Manifest;
use crate::source::ReadOutcome;

/// Recorded once an entry finishes, so its Central File Header can be built
/// after the fact with the real offset and sizes (§3).
struct EntryInfo {
    offset: u64,
    checksum: u32,
    size: u64,
    size_compressed: u64,
}

/// Builds the lazy byte stream for `manifest`. No entry payload and no full
/// archive are ever buffered: each yielded chunk is handed out as soon as
/// it's produced.
pub fn build_stream(
    manifest: Manifest,
    mut options: EncoderOptions,
) -> impl Stream<Item = Result<Bytes, EncodeError>> + Send + 'static {
    try_stream! {
        let stream_id = Uuid::now_v7();

        if let Some(err) = manifest.validation_error() {
            Err(EncodeError::Manifest(err))?;
        }

        if let Some(cb) = options.on_event.as_mut() {
            cb(Event::StreamStarted { stream_id });
        }

        let mut bytes_emitted: u64 = 0;
        let mut finished_entries: Vec<(usize, EntryInfo)> = Vec::new();

        'entries: for (index, entry) in manifest.entries().iter().enumerate() {
            let offset = bytes_emitted;

            if let Some(cb) = options.on_event.as_mut() {
                cb(Event::EntryStarted { stream_id, path: entry.path.clone() });
            }

            let header = local_file_header(entry);
            bytes_emitted += header.len() as u64;
            yield header;

            let built = entry.source.build().await;
            let mut source = match built {
                Ok(source) => source,
                Err(source_error) => {
                    halt_or_skip(&mut options, stream_id, entry.path.clone(), source_error)?;
                    continue 'entries;
                }
            };

            let mut compressor = compressor::build(&entry.method);
            let mut hasher = Hasher::new();
            let mut size = 0u64;
            let mut size_compressed = 0u64;
            let mut failed = false;

            loop {
                match source.read().await {
                    Ok(ReadOutcome::Chunk(chunk)) => {
                        if chunk.is_empty() {
                            continue;
                        }
                        hasher.update(&chunk);
                        size += chunk.len() as u64;
                        let out = compressor.feed(&chunk);
                        if !out.is_empty() {
                            size_compressed += out.len() as u64;
                            bytes_emitted += out.len() as u64;
                            yield out;
                        }
                    }
                    Ok(ReadOutcome::Eof) => break,
                    Err(source_error) => {
                        match halt_or_skip(&mut options, stream_id, entry.path.clone(), source_error) {
                            Ok(()) => {
                                failed = true;
                                break;
                            }
                            Err(e) => Err(e)?,
                        }
                    }
                }
            }

            if failed {
                continue 'entries;
            }

            let tail = compressor.close();
            if !tail.is_empty() {
                size_compressed += tail.len() as u64;
                bytes_emitted += tail.len() as u64;
                yield tail;
            }
            drop(compressor);

            let checksum = hasher.finalize();
            let dd = data_descriptor(checksum, size_compressed, size);
            bytes_emitted += dd.len() as u64;
            yield dd;

            if let Some(cb) = options.on_event.as_mut() {
                cb(Event::EntryFinished { stream_id, path: entry.path.clone(), size, size_compressed });
                cb(Event::Progress { stream_id, bytes_emitted });
            }

            finished_entries.push((index, EntryInfo { offset, checksum, size, size_compressed }));
        }

        let central_directory_offset = bytes_emitted;
        for (index, info) in &finished_entries {
            let entry = &manifest.entries()[*index];
            let header = central_file_header(entry, info.offset, info.checksum, info.size_compressed, info.size);
            bytes_emitted += header.len() as u64;
            yield header;
        }
        let central_directory_size = bytes_emitted - central_directory_offset;

        let trailer = EndOfArchive {
            entry_count: finished_entries.len() as u64,
            central_directory_size,
            central_directory_offset,
        }
        .encode();
        bytes_emitted += trailer.len() as u64;
        yield trailer;

        if let Some(cb) = options.on_event.as_mut() {
            cb(Event::ArchiveFinished { stream_id, bytes_emitted });
        }
    }
}

/// Reports an entry failure and applies `on_error`: `Ok(())` means skip and
/// keep going, `Err` carries the fatal error to propagate via `?`.
fn halt_or_skip(
    options: &mut EncoderOptions,
    stream_id: Uuid,
    path: String,
    source_error: crate::error::SourceError,
) -> Result<(), EncodeError> {
    let encode_error = EncodeError::Source { path: path.clone(), source: source_error };

    if let Some(cb) = options.on_event.as_mut() {
        cb(Event::EntryFailed { stream_id, path, error: encode_error.to_string() });
    }

    let decision = options.on_error.as_ref().map(|f| f(&encode_error)).unwrap_or(OnError::Halt);

    match decision {
        OnError::Skip => Ok(()),
        OnError::Halt => {
            if let Some(cb) = options.on_event.as_mut() {
                cb(Event::ArchiveFailed { stream_id, error: encode_error.to_string() });
            }
            Err(encode_error)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::manifest::{Entry, Manifest};
    use crate::source::SourceDescriptor;
    use futures::StreamExt;

    async fn collect(manifest: Manifest) -> Result<Vec<u8>, EncodeError> {
        let stream = build_stream(manifest, EncoderOptions::default());
        tokio::pin!(stream);
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }

    #[tokio::test]
    async fn empty_manifest_yields_manifest_error() {
        let result = collect(Manifest::create()).await;
        assert!(matches!(result, Err(EncodeError::Manifest(_))));
    }

    #[tokio::test]
    async fn single_stored_entry_produces_nonempty_archive_with_trailer() {
        let manifest =
            Manifest::create().append(Entry::new(SourceDescriptor::Random(128), "a.bin"));
        let archive = collect(manifest).await.unwrap();
        assert!(archive.len() > 128);
        assert_eq!(&archive[archive.len() - 22..archive.len() - 18], &0x06054b50u32.to_le_bytes());
    }

    #[tokio::test]
    async fn two_entries_both_appear_in_central_directory() {
        let manifest = Manifest::create()
            .append(Entry::new(SourceDescriptor::Random(16), "a.bin"))
            .append(Entry::new(SourceDescriptor::Random(16), "b.bin"));
        let archive = collect(manifest).await.unwrap();
        let needle_a = 0x02014b50u32.to_le_bytes();
        let count = archive.windows(4).filter(|w| *w == needle_a).count();
        assert_eq!(count, 2);
    }
}
