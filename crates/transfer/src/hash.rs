use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::{CHUNK_SIZE, TransferError};

/// Computes the block-chained content hash of a file, streaming.
///
/// Scheme (must match the remote store's `content_hash` exactly): split the
/// file into [`CHUNK_SIZE`] blocks, SHA-256 each block, concatenate the raw
/// block digests in order, SHA-256 the concatenation, hex-encode.
///
/// Reads in CHUNK_SIZE blocks regardless of file size, so memory stays
/// O(CHUNK_SIZE). Depends only on byte content, never on file metadata.
pub fn content_hash_file(path: &Path) -> Result<String, TransferError> {
    let mut file = std::fs::File::open(path)?;
    let mut block = vec![0u8; CHUNK_SIZE];
    let mut block_hashes = Sha256::new();

    loop {
        let mut filled = 0;
        while filled < CHUNK_SIZE {
            let n = file.read(&mut block[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            break;
        }
        block_hashes.update(Sha256::digest(&block[..filled]));
        if filled < CHUNK_SIZE {
            break;
        }
    }

    Ok(hex::encode(block_hashes.finalize()))
}

/// Same block-chained scheme over an in-memory slice.
///
/// Used by the in-memory store backend so that `get_metadata` advertises
/// hashes the existence check can compare against.
pub fn content_hash_bytes(data: &[u8]) -> String {
    let mut block_hashes = Sha256::new();
    for block in data.chunks(CHUNK_SIZE) {
        block_hashes.update(Sha256::digest(block));
    }
    hex::encode(block_hashes.finalize())
}
