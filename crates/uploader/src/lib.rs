//! Resumable, verified chunked-upload engine.
//!
//! This crate implements the **business logic** of uploading one local file
//! to one remote destination. It is a library crate with no transport
//! dependencies; backends implement the `RemoteStore` trait from
//! `snapvault-remote`.
//!
//! # Pipeline
//!
//! 1. **Evaluate**: fetch remote metadata, compare content hashes
//! 2. **Upload**: single request for small files, chunked session otherwise
//! 3. **Retry**: restart the whole attempt on transient failures, bounded
//!
//! Progress events are sent via an `mpsc` channel; one [`UploadOutcome`]
//! is produced per (file, destination) pair.

pub mod error;
pub mod existence;
pub mod retry;
pub mod session;
pub mod types;
pub mod uploader;

pub use error::UploadError;
pub use existence::{Presence, evaluate};
pub use retry::RetryPolicy;
pub use types::{UploadEvent, UploadOutcome};
pub use uploader::Uploader;
