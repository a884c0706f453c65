// © 2019 3D Robotics. License: Apache-2.0
//! Synchronous, in-order progress notifications emitted while a stream is
//! pulled (§4.7). Delivery happens on whatever task is polling the stream;
//! a panicking handler propagates to that caller, exactly as for any other
//! panic in polled code — no `catch_unwind` is added here.

use uuid::Uuid;

use crate::error::EncodeError;

#[derive(Debug)]
pub enum Event {
    /// The stream started; fired once before the first entry is encoded.
    StreamStarted { stream_id: Uuid },
    /// A new entry started encoding.
    EntryStarted { stream_id: Uuid, path: String },
    /// An entry finished successfully.
    EntryFinished { stream_id: Uuid, path: String, size: u64, size_compressed: u64 },
    /// An entry's source or compressor failed.
    EntryFailed { stream_id: Uuid, path: String, error: String },
    /// `bytes_emitted` advanced; fired after every chunk handed to the
    /// underlying stream.
    Progress { stream_id: Uuid, bytes_emitted: u64 },
    /// The central directory and trailing records have been emitted.
    ArchiveFinished { stream_id: Uuid, bytes_emitted: u64 },
    /// The whole stream failed and will yield no further chunks.
    ArchiveFailed { stream_id: Uuid, error: String },
}

pub type OnEvent = Box<dyn FnMut(Event) + Send>;

/// What to do when one entry's source or compressor fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OnError {
    /// Stop the whole stream, yielding the error as the stream's last item.
    #[default]
    Halt,
    /// Drop the failing entry and continue with the next one.
    Skip,
}

pub type ErrorHandler = std::sync::Arc<dyn Fn(&EncodeError) -> OnError + Send + Sync>;
