// © 2019 3D Robotics. License: Apache-2.0
use bytes::{Bytes, BytesMut};
use rand::rngs::OsRng;
use rand::RngCore;

use super::{ReadOutcome, Source};
use crate::error::SourceError;

const CHUNK_SIZE: usize = 64 * 1024;

/// Cryptographically strong random bytes, drawn from the OS CSPRNG rather
/// than a seeded PRNG — the correct reading of "strong random bytes."
#[derive(Debug)]
pub struct RandomSource {
    remaining: u64,
}

impl RandomSource {
    pub fn new(byte_count: u64) -> Self {
        RandomSource { remaining: byte_count }
    }
}

#[async_trait::async_trait]
impl Source for RandomSource {
    async fn read(&mut self) -> Result<ReadOutcome, SourceError> {
        if self.remaining == 0 {
            return Ok(ReadOutcome::Eof);
        }
        let chunk_len = std::cmp::min(self.remaining, CHUNK_SIZE as u64) as usize;
        let mut buf = BytesMut::zeroed(chunk_len);
        OsRng.fill_bytes(&mut buf);
        self.remaining -= chunk_len as u64;
        Ok(ReadOutcome::Chunk(buf.freeze()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn produces_exactly_byte_count_bytes() {
        let mut source = RandomSource::new(CHUNK_SIZE as u64 + 7);
        let mut total = 0usize;
        loop {
            match source.read().await.unwrap() {
                ReadOutcome::Chunk(chunk) => total += chunk.len(),
                ReadOutcome::Eof => break,
            }
        }
        assert_eq!(total, CHUNK_SIZE + 7);
    }

    #[tokio::test]
    async fn zero_byte_count_is_immediate_eof() {
        let mut source = RandomSource::new(0);
        assert!(matches!(source.read().await.unwrap(), ReadOutcome::Eof));
    }
}
