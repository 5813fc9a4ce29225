//! Snapshot references and the snapshot source boundary.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A snapshot archive known to the supervisor. Immutable once listed;
/// the backup core only reads these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub slug: String,
    pub name: String,
    #[serde(rename = "date")]
    pub created: DateTime<Utc>,
}

/// Errors from a snapshot source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Boxed future returned by [`SnapshotSource`] operations.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Supplies the ordered snapshot list and local deletion.
///
/// Implementations must return snapshots newest-first: the most recent
/// snapshot is backed up first, and retention keeps the head of the list.
pub trait SnapshotSource: Send + Sync {
    fn list<'a>(&'a self) -> SourceFuture<'a, Vec<Snapshot>>;

    /// Deletes the local snapshot with the given slug.
    fn remove<'a>(&'a self, slug: &'a str) -> SourceFuture<'a, ()>;
}

/// Local archive path for a snapshot: `backup_dir/slug.tar`.
pub fn local_path(backup_dir: &Path, snapshot: &Snapshot) -> PathBuf {
    backup_dir.join(format!("{}.tar", snapshot.slug))
}

/// Remote destination path: `remote_dir/(name|slug).tar`.
///
/// Deterministic by construction; collisions with different content can
/// only mean a stale prior upload, which the existence check resolves.
pub fn remote_path(remote_dir: &str, snapshot: &Snapshot, use_filename: bool) -> String {
    let stem = if use_filename { &snapshot.name } else { &snapshot.slug };
    format!("{}/{}.tar", remote_dir.trim_end_matches('/'), stem)
}
