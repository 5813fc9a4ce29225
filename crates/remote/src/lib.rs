//! Remote object store capability boundary.
//!
//! The upload engine only ever talks to a [`RemoteStore`], never to a
//! concrete backend. Each backend adapter (Dropbox, in-memory, ...) is
//! responsible for classifying its own failures into [`StoreError`]
//! variants, because the retry policy upstream decides based on that
//! classification alone.

mod memory;
mod store;

pub use memory::{MemoryStore, Op};
pub use store::{RemoteMetadata, RemoteStore, StoreFuture};

/// Errors produced by remote store operations.
///
/// `Clone` so backends can queue planned errors for deterministic tests.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Network or rate-limit failure. Safe to retry.
    #[error("transient store error: {0}")]
    Transient(String),

    /// Auth or invalid-destination failure. Retrying cannot help.
    #[error("fatal store error: {0}")]
    Fatal(String),

    /// The local cursor and the store's session state disagree.
    /// Retryable: the session is abandoned and the upload restarts.
    #[error("session offset mismatch: store expects {expected}, got {got}")]
    OffsetMismatch { expected: u64, got: u64 },
}

impl StoreError {
    /// Returns `true` if a fresh attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Transient(_) | StoreError::OffsetMismatch { .. } => true,
            StoreError::Fatal(_) => false,
        }
    }
}
