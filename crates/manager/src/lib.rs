//! Snapshot backup orchestration.
//!
//! Thin glue around the upload engine: list snapshots from the supervisor,
//! derive destination paths, run one upload per (snapshot, destination)
//! pair, and apply local retention. The engine itself lives in
//! `snapvault-uploader`; everything here is deliberately plain I/O.

pub mod config;
pub mod manager;
pub mod snapshot;
pub mod supervisor;

pub use config::{Config, ConfigError, DEFAULT_CONFIG_PATH};
pub use manager::{BackupManager, BackupReport, RemoteTarget};
pub use snapshot::{Snapshot, SnapshotSource, SourceError, SourceFuture, local_path, remote_path};
pub use supervisor::SupervisorClient;
