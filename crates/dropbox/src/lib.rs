//! Dropbox backend for the remote store capability.
//!
//! Async HTTP adapter using `reqwest` with Bearer token authentication.
//! Implements the upload primitives of `snapvault_remote::RemoteStore` over
//! the Dropbox HTTP API v2 and classifies every failure into
//! `StoreError::Transient` / `Fatal` / `OffsetMismatch` at this boundary,
//! since the retry policy upstream depends on that classification.

mod store;

pub use store::DropboxStore;
