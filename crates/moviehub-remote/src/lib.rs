//! Remote versioned store for MovieHub.
//!
//! Blobs are addressed by site-relative path and carry an opaque revision
//! token. Writes are optimistic: an update names the revision it replaces.

pub mod error;
pub mod github;
pub mod memory;
pub mod store;
pub mod upsert;

pub use error::RemoteError;
pub use github::GitHubStore;
pub use memory::{InMemoryStore, StoreOp};
pub use store::{RemoteBlob, RemoteStore};
pub use upsert::{upsert_blob, CommitMessages, UpsertOutcome};
