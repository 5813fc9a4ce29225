//! Chunked snapshot reading and content hashing.
//!
//! Snapshot archives are streamed in fixed-size chunks so memory use stays
//! O(chunk size) regardless of archive size. The content hash follows the
//! block-chained scheme advertised by the remote store, which lets local and
//! remote content be compared without transferring the file.

mod chunked;
mod format;
mod hash;

pub use chunked::ChunkReader;
pub use format::bytes_to_human;
pub use hash::{content_hash_bytes, content_hash_file};

/// Chunk size: 4 MiB.
///
/// This is a hard external contract, not a tuning knob: the remote store's
/// `content_hash` scheme digests the file in blocks of exactly this size,
/// so the comparison in the existence check is only meaningful if uploads
/// and hashing both use it.
pub const CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
