//! Single upload attempt: the session state machine.
//!
//! One call to [`upload_once`] drives `ChunkReader` against `RemoteStore`
//! from `Idle` to `Committed`:
//!
//! ```text
//! Idle -> SmallUpload ------------------> Committed   (size <= chunk)
//! Idle -> SessionStarted -> Appending* -> Finishing -> Committed
//! ```
//!
//! Any error aborts the attempt; retry handling lives one level up in
//! [`Uploader`](crate::Uploader) and always restarts from `Idle`.

use std::path::Path;

use snapvault_remote::RemoteStore;
use snapvault_transfer::{CHUNK_SIZE, ChunkReader};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::UploadError;
use crate::types::UploadEvent;

/// Opaque session token plus the number of bytes the store has acknowledged.
///
/// The offset is advanced only after a successful append, so it always
/// equals the bytes committed remotely. Never persisted: a crash mid-upload
/// means the next run starts over with a brand-new session.
#[derive(Debug, Clone)]
pub struct SessionCursor {
    pub session_id: String,
    pub offset: u64,
}

/// Rate-limits progress reporting to >= 5 percentage-point steps.
pub(crate) struct ProgressGate {
    last_percent: Option<u8>,
}

impl ProgressGate {
    pub(crate) fn new() -> Self {
        Self { last_percent: None }
    }

    /// Returns `true` if `percent` should be reported.
    pub(crate) fn admit(&mut self, percent: u8) -> bool {
        let emit = match self.last_percent {
            None => true,
            Some(last) => percent >= last.saturating_add(5) || (percent == 100 && last < 100),
        };
        if emit {
            self.last_percent = Some(percent);
        }
        emit
    }
}

/// Runs one complete upload attempt for `local` to `dest`.
///
/// `chunk_size` of 0 selects [`CHUNK_SIZE`]. Files no larger than one chunk
/// take the single-request path and never touch session machinery. The file
/// handle lives inside the `ChunkReader` and is dropped on every exit path.
pub async fn upload_once(
    store: &dyn RemoteStore,
    local: &Path,
    dest: &str,
    chunk_size: usize,
    events: &mpsc::Sender<UploadEvent>,
) -> Result<(), UploadError> {
    let chunk_size = if chunk_size == 0 { CHUNK_SIZE } else { chunk_size };
    let mut reader = ChunkReader::new(local, chunk_size)?;
    let total = reader.file_size();
    let mut gate = ProgressGate::new();

    // Small-file path: one request, no session.
    if total <= chunk_size as u64 {
        let data = reader.next_chunk()?.unwrap_or_default();
        store.put_small(dest, &data).await?;
        report(events, &mut gate, dest, total, total).await;
        return Ok(());
    }

    let first = reader.next_chunk()?.ok_or(UploadError::SourceTruncated)?;
    let session_id = store.session_start(&first).await?;
    let mut cursor = SessionCursor {
        session_id,
        offset: reader.offset(),
    };
    debug!(dest = %dest, session = %cursor.session_id, total, "upload session started");
    report(events, &mut gate, dest, cursor.offset, total).await;

    // Append until the remainder fits in the final chunk.
    while reader.remaining() > chunk_size as u64 {
        let chunk = reader.next_chunk()?.ok_or(UploadError::SourceTruncated)?;
        store
            .session_append(&cursor.session_id, cursor.offset, &chunk)
            .await?;
        cursor.offset += chunk.len() as u64;
        report(events, &mut gate, dest, cursor.offset, total).await;
    }

    // Exactly one finish call, made when remaining <= chunk_size.
    let last = reader.next_chunk()?.ok_or(UploadError::SourceTruncated)?;
    store
        .session_finish(&cursor.session_id, cursor.offset, &last, dest)
        .await?;
    cursor.offset += last.len() as u64;
    report(events, &mut gate, dest, cursor.offset, total).await;

    Ok(())
}

async fn report(
    events: &mpsc::Sender<UploadEvent>,
    gate: &mut ProgressGate,
    dest: &str,
    transferred: u64,
    total: u64,
) {
    let percent = if total == 0 {
        100
    } else {
        (transferred * 100 / total) as u8
    };
    if gate.admit(percent) {
        debug!(dest = %dest, percent, transferred, total, "upload progress");
        let _ = events
            .send(UploadEvent::Progress {
                dest: dest.to_string(),
                percent,
                transferred,
                total,
            })
            .await;
    }
}
