//! Persistence-service client and debounced write-behind sync for par-notes.
//!
//! Provides:
//! - `record`: `TabRecord` wire type and the `SyncBatch` snapshot
//! - `backend`: the `SyncBackend` trait, `push_batch`, and an in-memory backend
//! - `http`: `ureq`-based backend for `GET /tabs` / `POST /tabs`
//! - `scheduler`: cancellable, coalescing timer that sends only the latest snapshot
//! - `error`: typed `SyncError`

pub mod backend;
pub mod error;
pub mod http;
pub mod record;
pub mod scheduler;

pub use backend::{MemoryBackend, SyncBackend, SyncOutcome, push_batch};
pub use error::SyncError;
pub use http::HttpBackend;
pub use record::{SyncBatch, TabRecord};
pub use scheduler::SyncScheduler;
