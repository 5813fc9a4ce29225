//! Per-file upload driver: existence check, attempt loop, outcome.

use std::path::Path;

use snapvault_remote::RemoteStore;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::error::UploadError;
use crate::existence::{Presence, evaluate};
use crate::retry::RetryPolicy;
use crate::session::upload_once;
use crate::types::{UploadEvent, UploadOutcome};

/// Drives one file to one destination through evaluate + retried upload.
///
/// Holds no per-upload state itself; each attempt opens its own reader and
/// starts its own session, so the same `Uploader` can be reused across
/// files and destinations.
pub struct Uploader<'a> {
    store: &'a dyn RemoteStore,
    retry: RetryPolicy,
    chunk_size: usize,
}

impl<'a> Uploader<'a> {
    /// Creates an uploader with the default retry policy and chunk size.
    pub fn new(store: &'a dyn RemoteStore) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
            chunk_size: 0, // 0 selects snapvault_transfer::CHUNK_SIZE
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Uploads `local` to `dest`, producing exactly one [`UploadOutcome`].
    ///
    /// Failures never escape as errors: they are folded into
    /// `UploadOutcome::Failed` so one file's failure cannot abort a batch.
    pub async fn upload(
        &self,
        local: &Path,
        dest: &str,
        events: &mpsc::Sender<UploadEvent>,
    ) -> UploadOutcome {
        match evaluate(self.store, local, dest).await {
            Ok(Presence::Present) => {
                info!(dest = %dest, "already present with matching content hash, skipping");
                let _ = events.send(UploadEvent::Skipped { dest: dest.to_string() }).await;
                return UploadOutcome::Skipped {
                    reason: "destination already holds identical content".into(),
                };
            }
            Ok(Presence::Absent) => {}
            Err(e) => {
                error!(dest = %dest, error = %e, "existence check failed");
                let _ = events
                    .send(UploadEvent::Failed {
                        dest: dest.to_string(),
                        error: e.to_string(),
                    })
                    .await;
                return UploadOutcome::Failed { error: e.to_string() };
            }
        }

        let total = match std::fs::metadata(local) {
            Ok(meta) => meta.len(),
            Err(e) => {
                error!(path = %local.display(), error = %e, "cannot stat local file");
                return UploadOutcome::Failed { error: e.to_string() };
            }
        };
        let _ = events
            .send(UploadEvent::Started { dest: dest.to_string(), total })
            .await;

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match upload_once(self.store, local, dest, self.chunk_size, events).await {
                Ok(()) => {
                    info!(dest = %dest, attempt, "upload committed");
                    let _ = events.send(UploadEvent::Completed { dest: dest.to_string() }).await;
                    return UploadOutcome::Uploaded { dest: dest.to_string() };
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        dest = %dest,
                        attempt,
                        delay_secs = format_args!("{:.1}", delay.as_secs_f64()),
                        error = %e,
                        "attempt failed, restarting upload from offset 0"
                    );
                    let _ = events
                        .send(UploadEvent::Retrying {
                            dest: dest.to_string(),
                            attempt,
                            delay_secs: delay.as_secs_f64(),
                        })
                        .await;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(dest = %dest, attempt, error = %e, "upload failed");
                    let _ = events
                        .send(UploadEvent::Failed {
                            dest: dest.to_string(),
                            error: e.to_string(),
                        })
                        .await;
                    return UploadOutcome::Failed { error: e.to_string() };
                }
            }
        }
    }
}
