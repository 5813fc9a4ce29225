//! Backup run orchestration and local retention.

use std::path::PathBuf;
use std::sync::Arc;

use snapvault_remote::RemoteStore;
use snapvault_transfer::bytes_to_human;
use snapvault_uploader::{UploadEvent, UploadOutcome, Uploader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::snapshot::{SnapshotSource, SourceError, local_path, remote_path};

/// One remote destination for backups.
pub struct RemoteTarget {
    /// Human-readable target name for logs and reports ("dropbox").
    pub name: String,
    pub store: Arc<dyn RemoteStore>,
    pub remote_dir: String,
    pub use_filename: bool,
}

/// Outcome of one (snapshot, target) pair.
#[derive(Debug, Clone)]
pub struct BackupReport {
    pub slug: String,
    pub target: String,
    pub dest: String,
    pub outcome: UploadOutcome,
}

/// Runs backups of supervisor snapshots to all configured targets.
pub struct BackupManager {
    source: Arc<dyn SnapshotSource>,
    targets: Vec<RemoteTarget>,
    backup_dir: PathBuf,
}

impl BackupManager {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        targets: Vec<RemoteTarget>,
        backup_dir: PathBuf,
    ) -> Self {
        Self {
            source,
            targets,
            backup_dir,
        }
    }

    /// Backs up every snapshot to every target, newest first.
    ///
    /// One pair's failure never aborts the rest: each pair yields its own
    /// [`BackupReport`]. Only a failure to list snapshots is global, since
    /// there is nothing to iterate without the list.
    pub async fn backup_all(
        &self,
        events: &mpsc::Sender<UploadEvent>,
    ) -> Result<Vec<BackupReport>, SourceError> {
        let snapshots = self.source.list().await?;
        if snapshots.is_empty() {
            warn!("no snapshots found to backup");
            return Ok(Vec::new());
        }
        info!(count = snapshots.len(), "backing up snapshots");

        let mut reports = Vec::with_capacity(snapshots.len() * self.targets.len());
        for (i, snapshot) in snapshots.iter().enumerate() {
            let path = local_path(&self.backup_dir, snapshot);
            let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            info!(
                slug = %snapshot.slug,
                name = %snapshot.name,
                created = %snapshot.created,
                size = %bytes_to_human(size),
                progress = format_args!("{}/{}", i + 1, snapshots.len()),
                "processing snapshot"
            );

            for target in &self.targets {
                let dest = remote_path(&target.remote_dir, snapshot, target.use_filename);
                info!(slug = %snapshot.slug, target = %target.name, dest = %dest, "uploading");

                let uploader = Uploader::new(target.store.as_ref());
                let outcome = uploader.upload(&path, &dest, events).await;
                if let UploadOutcome::Failed { error } = &outcome {
                    warn!(slug = %snapshot.slug, target = %target.name, error = %error, "backup failed");
                }
                reports.push(BackupReport {
                    slug: snapshot.slug.clone(),
                    target: target.name.clone(),
                    dest,
                    outcome,
                });
            }
        }
        Ok(reports)
    }

    /// Deletes all but the `keep` newest local snapshots.
    ///
    /// Returns the number of snapshots removed. Individual removal failures
    /// are logged and skipped so one stuck snapshot cannot stall retention.
    pub async fn clean_local(&self, keep: usize) -> Result<usize, SourceError> {
        info!(keep, "cleaning up local snapshots");
        let snapshots = self.source.list().await?;

        let mut removed = 0;
        for snapshot in snapshots.iter().skip(keep) {
            info!(slug = %snapshot.slug, created = %snapshot.created, "deleting local snapshot");
            match self.source.remove(&snapshot.slug).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(slug = %snapshot.slug, error = %e, "failed to delete snapshot"),
            }
        }
        Ok(removed)
    }
}
