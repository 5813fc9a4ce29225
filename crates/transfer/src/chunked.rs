use std::io::Read;
use std::path::Path;

use crate::{CHUNK_SIZE, TransferError};

/// Reads a file as an ordered, forward-only sequence of fixed-size chunks.
///
/// The cursor only moves forward; there is no seek. Restarting an upload
/// means reopening the file at position 0 with a fresh reader, which is what
/// keeps a crashed session from ever resuming against stale remote state.
pub struct ChunkReader {
    file: std::fs::File,
    chunk_size: usize,
    offset: u64,
    file_size: u64,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    ///
    /// If `chunk_size` is 0, [`CHUNK_SIZE`] (4 MiB) is used.
    pub fn new(path: &Path, chunk_size: usize) -> Result<Self, TransferError> {
        let file = std::fs::File::open(path)?;
        let file_size = file.metadata()?.len();
        let chunk_size = if chunk_size == 0 { CHUNK_SIZE } else { chunk_size };
        Ok(Self {
            file,
            chunk_size,
            offset: 0,
            file_size,
        })
    }

    /// Reads the next chunk. Returns `None` at end of file.
    ///
    /// Every chunk is exactly `chunk_size` bytes except possibly the last.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransferError> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(None);
        }

        let read_size = std::cmp::min(remaining, self.chunk_size as u64) as usize;
        let mut buf = vec![0u8; read_size];
        let mut filled = 0;
        while filled < read_size {
            let n = self.file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        if buf.is_empty() {
            return Ok(None);
        }

        self.offset += buf.len() as u64;
        Ok(Some(buf))
    }

    /// Current byte offset (bytes handed out so far).
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Total file size in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Bytes remaining to read.
    pub fn remaining(&self) -> u64 {
        self.file_size - self.offset
    }
}
