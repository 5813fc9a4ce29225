//! Outcome and event types for the upload engine.

/// Final result of one (file, destination) upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The destination already holds an object with the same content hash.
    Skipped { reason: String },
    /// The object was fully committed at `dest`.
    Uploaded { dest: String },
    /// The upload failed after classification and retries.
    Failed { error: String },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, UploadOutcome::Failed { .. })
    }
}

/// Events emitted while an upload runs.
///
/// Observational only: percentages and sizes for a human-facing log or UI,
/// never part of the programmatic contract.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    Started {
        dest: String,
        total: u64,
    },
    Progress {
        dest: String,
        percent: u8,
        transferred: u64,
        total: u64,
    },
    Retrying {
        dest: String,
        attempt: u32,
        delay_secs: f64,
    },
    Skipped {
        dest: String,
    },
    Completed {
        dest: String,
    },
    Failed {
        dest: String,
        error: String,
    },
}
