//! Pre-upload existence check: skip, overwrite, or upload.

use std::path::Path;

use snapvault_remote::RemoteStore;
use snapvault_transfer::content_hash_file;
use tracing::{info, warn};

use crate::error::UploadError;

/// Whether the destination already holds the local file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Same content hash remote and local; uploading would be a no-op.
    Present,
    /// Nothing usable at the destination; the caller should upload.
    Absent,
}

/// Decides whether `local` needs uploading to `dest`.
///
/// Metadata fetch failures of any kind are treated as "not found": worst
/// case we upload something that was already there. On a hash conflict the
/// remote object is deleted so the caller can re-upload: destination paths
/// derive deterministically from snapshot identity, so different content
/// under the same name can only be a stale or corrupt prior upload.
/// A delete failure propagates; a local read failure is fatal for this file.
pub async fn evaluate(
    store: &dyn RemoteStore,
    local: &Path,
    dest: &str,
) -> Result<Presence, UploadError> {
    let meta = match store.get_metadata(dest).await {
        Ok(Some(meta)) => meta,
        Ok(None) => {
            info!(dest = %dest, "no existing object at destination");
            return Ok(Presence::Absent);
        }
        Err(e) => {
            info!(dest = %dest, error = %e, "metadata fetch failed, treating destination as absent");
            return Ok(Presence::Absent);
        }
    };

    let local_hash = content_hash_file(local)?;
    if local_hash == meta.content_hash {
        return Ok(Presence::Present);
    }

    warn!(
        dest = %dest,
        local_hash = %local_hash,
        remote_hash = %meta.content_hash,
        "destination holds different content, deleting it for re-upload"
    );
    store.delete(dest).await?;
    Ok(Presence::Absent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapvault_remote::{MemoryStore, Op, StoreError};
    use tempfile::TempDir;

    fn snapshot(dir: &TempDir, data: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join("snap.tar");
        std::fs::write(&path, data).unwrap();
        path
    }

    #[tokio::test]
    async fn missing_object_is_absent() {
        let dir = TempDir::new().unwrap();
        let path = snapshot(&dir, b"content");
        let store = MemoryStore::new();

        let presence = evaluate(&store, &path, "/b/s.tar").await.unwrap();
        assert_eq!(presence, Presence::Absent);
        // No local hashing happens for a missing object.
        assert_eq!(store.calls(Op::Delete), 0);
    }

    #[tokio::test]
    async fn matching_hash_is_present() {
        let dir = TempDir::new().unwrap();
        let path = snapshot(&dir, b"same bytes");
        let store = MemoryStore::new();
        store.insert_object("/b/s.tar", b"same bytes".to_vec());

        let presence = evaluate(&store, &path, "/b/s.tar").await.unwrap();
        assert_eq!(presence, Presence::Present);
    }

    #[tokio::test]
    async fn conflicting_hash_deletes_once_and_is_absent() {
        let dir = TempDir::new().unwrap();
        let path = snapshot(&dir, b"local version");
        let store = MemoryStore::new();
        store.insert_object("/b/s.tar", b"remote version".to_vec());

        let presence = evaluate(&store, &path, "/b/s.tar").await.unwrap();
        assert_eq!(presence, Presence::Absent);
        assert_eq!(store.calls(Op::Delete), 1);
        assert!(store.object("/b/s.tar").is_none());
    }

    #[tokio::test]
    async fn metadata_error_is_treated_as_absent() {
        let dir = TempDir::new().unwrap();
        let path = snapshot(&dir, b"content");
        let store = MemoryStore::new();
        store.inject_fault(Op::GetMetadata, StoreError::Transient("net".into()));

        let presence = evaluate(&store, &path, "/b/s.tar").await.unwrap();
        assert_eq!(presence, Presence::Absent);
    }

    #[tokio::test]
    async fn unreadable_local_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new();
        store.insert_object("/b/s.tar", b"remote".to_vec());

        let result = evaluate(&store, &dir.path().join("missing.tar"), "/b/s.tar").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn delete_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let path = snapshot(&dir, b"local");
        let store = MemoryStore::new();
        store.insert_object("/b/s.tar", b"remote".to_vec());
        store.inject_fault(Op::Delete, StoreError::Fatal("forbidden".into()));

        let result = evaluate(&store, &path, "/b/s.tar").await;
        assert!(matches!(result, Err(UploadError::Store(StoreError::Fatal(_)))));
    }
}
