//! Upload error types.

use snapvault_remote::StoreError;
use snapvault_transfer::TransferError;

/// Errors produced while uploading one file.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The reader reported remaining bytes but produced no chunk. Means the
    /// file shrank mid-upload; restarting would read the new content anyway.
    #[error("source file truncated during upload")]
    SourceTruncated,
}

impl UploadError {
    /// Returns `true` if a fresh attempt (new session, offset 0) may succeed.
    ///
    /// Local I/O failures and fatal store errors never are; an offset
    /// mismatch is, because the broken session is abandoned entirely.
    pub fn is_retryable(&self) -> bool {
        match self {
            UploadError::Store(e) => e.is_retryable(),
            UploadError::Io(_) | UploadError::Transfer(_) | UploadError::SourceTruncated => false,
        }
    }
}
