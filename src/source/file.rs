// © 2019 3D Robotics. License: Apache-2.0
use std::path::Path;

use bytes::{Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::{ReadOutcome, Source};
use crate::error::SourceError;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug)]
pub struct FileSource {
    file: File,
}

impl FileSource {
    pub async fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::FileNotFound(path.to_path_buf())
            } else {
                SourceError::Io(e)
            }
        })?;
        Ok(FileSource { file })
    }
}

#[async_trait::async_trait]
impl Source for FileSource {
    async fn read(&mut self) -> Result<ReadOutcome, SourceError> {
        let mut buf = BytesMut::zeroed(CHUNK_SIZE);
        let n = self.file.read(&mut buf).await?;
        if n == 0 {
            return Ok(ReadOutcome::Eof);
        }
        buf.truncate(n);
        Ok(ReadOutcome::Chunk(buf.freeze()))
    }
}
