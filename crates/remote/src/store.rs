use std::future::Future;
use std::pin::Pin;

use crate::StoreError;

/// Boxed future returned by [`RemoteStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Metadata the store advertises for a committed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMetadata {
    /// Block-chained content hash, hex-encoded.
    pub content_hash: String,
    /// Object size in bytes.
    pub size: u64,
}

/// Upload primitives any remote object store backend must implement.
///
/// Objects become visible to [`get_metadata`](RemoteStore::get_metadata)
/// only through [`put_small`](RemoteStore::put_small) or
/// [`session_finish`](RemoteStore::session_finish); a session that never
/// finishes leaves nothing behind at the destination.
pub trait RemoteStore: Send + Sync {
    /// Uploads a whole object in a single request. For content no larger
    /// than one chunk.
    fn put_small<'a>(&'a self, dest: &'a str, data: &'a [u8]) -> StoreFuture<'a, ()>;

    /// Begins a resumable session, uploading the first chunk.
    /// Returns the opaque session identifier.
    fn session_start<'a>(&'a self, first_chunk: &'a [u8]) -> StoreFuture<'a, String>;

    /// Uploads a middle chunk. `offset` must equal the store's expected
    /// offset for the session or the call fails with
    /// [`StoreError::OffsetMismatch`].
    fn session_append<'a>(
        &'a self,
        session_id: &'a str,
        offset: u64,
        chunk: &'a [u8],
    ) -> StoreFuture<'a, ()>;

    /// Uploads the final chunk and atomically materializes the object
    /// at `dest`.
    fn session_finish<'a>(
        &'a self,
        session_id: &'a str,
        offset: u64,
        last_chunk: &'a [u8],
        dest: &'a str,
    ) -> StoreFuture<'a, ()>;

    /// Fetches metadata for `dest`. `Ok(None)` means no object exists.
    fn get_metadata<'a>(&'a self, dest: &'a str) -> StoreFuture<'a, Option<RemoteMetadata>>;

    /// Deletes the object at `dest`.
    fn delete<'a>(&'a self, dest: &'a str) -> StoreFuture<'a, ()>;
}
