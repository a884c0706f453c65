// © 2019 3D Robotics. License: Apache-2.0
//! Per-entry payload transform: STORE passes bytes through, Deflate runs
//! them through a raw `flate2::Compress` stream (§4.2).

use bytes::Bytes;
use flate2::{Compress, FlushCompress, Status};

use crate::manifest::{DeflateOptions, Method, Strategy};

/// `open` is folded into [`build`] (construction already is "opened");
/// `finalize` is folded into `Drop` — there is no native handle below
/// `flate2::Compress` that needs an explicit release call.
pub trait Compressor: Send {
    /// Compress (or pass through) one input chunk, returning whatever output
    /// bytes are ready now. May return an empty `Bytes` if the backend is
    /// still buffering.
    fn feed(&mut self, input: &[u8]) -> Bytes;

    /// Flush any buffered output at end-of-entry. After this call the
    /// compressor must not be fed again; callers discard it.
    fn close(&mut self) -> Bytes;
}

pub fn build(method: &Method) -> Box<dyn Compressor> {
    match method {
        Method::Store => Box::new(StoreCompressor),
        Method::Deflate(opts) => Box::new(DeflateCompressor::new(opts)),
    }
}

struct StoreCompressor;

impl Compressor for StoreCompressor {
    fn feed(&mut self, input: &[u8]) -> Bytes {
        Bytes::copy_from_slice(input)
    }

    fn close(&mut self) -> Bytes {
        Bytes::new()
    }
}

/// Raw DEFLATE (no zlib header) via `flate2`'s low-level streaming API.
///
/// `Strategy` is accepted for API completeness but `flate2`'s safe backend
/// (`miniz_oxide`) has no `deflateParams`-style strategy knob; non-default
/// strategies are accepted and logged, not rejected.
struct DeflateCompressor {
    inner: Compress,
}

impl DeflateCompressor {
    fn new(opts: &DeflateOptions) -> Self {
        if opts.strategy != Strategy::Default {
            log::debug!(
                "deflate strategy {:?} requested but has no effect with this backend",
                opts.strategy
            );
        }
        DeflateCompressor { inner: Compress::new(opts.level.to_flate2(), false) }
    }

    /// `Compress::compress_vec` only ever writes into a `Vec`'s existing
    /// spare capacity; it never grows the vec itself. So this reserves a
    /// chunk of spare capacity up front and keeps calling in a loop,
    /// reserving more between calls, until every input byte is consumed and,
    /// for `Finish`, until the stream reports `StreamEnd`.
    fn drain(&mut self, input: &[u8], flush: FlushCompress) -> Bytes {
        const CHUNK: usize = 8192;

        let mut out = Vec::with_capacity(std::cmp::max(input.len() / 2, CHUNK));
        let mut offset = 0;

        loop {
            let before_in = self.inner.total_in();
            let before_out = self.inner.total_out();

            if out.capacity() == out.len() {
                out.reserve(CHUNK);
            }

            let status = self
                .inner
                .compress_vec(&input[offset..], &mut out, flush)
                .expect("flate2 compress never fails on valid input");

            offset += (self.inner.total_in() - before_in) as usize;
            let produced = (self.inner.total_out() - before_out) as usize;
            let input_exhausted = offset >= input.len();

            match status {
                Status::StreamEnd => break,
                _ if flush != FlushCompress::Finish && input_exhausted && produced == 0 => break,
                _ => continue,
            }
        }

        Bytes::from(out)
    }
}

impl Compressor for DeflateCompressor {
    fn feed(&mut self, input: &[u8]) -> Bytes {
        self.drain(input, FlushCompress::None)
    }

    fn close(&mut self) -> Bytes {
        self.drain(&[], FlushCompress::Finish)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::manifest::Level;

    #[test]
    fn store_passes_bytes_through_unchanged() {
        let mut c = build(&Method::Store);
        let mut out = c.feed(b"hello world").to_vec();
        out.extend_from_slice(&c.close());
        assert_eq!(out, b"hello world");
    }

    #[test]
    fn deflate_produces_nonempty_output_for_nonempty_input() {
        let method = Method::Deflate(DeflateOptions { level: Level::Default, strategy: Strategy::Default });
        let mut c = build(&method);
        let mut out = c.feed(&vec![b'a'; 4096]).to_vec();
        out.extend_from_slice(&c.close());
        assert!(!out.is_empty());
        assert!(out.len() < 4096);
    }

    #[test]
    fn deflate_close_on_empty_entry_produces_valid_stream() {
        let method = Method::Deflate(DeflateOptions::default());
        let mut c = build(&method);
        let out = c.close();
        assert!(!out.is_empty());
    }
}
