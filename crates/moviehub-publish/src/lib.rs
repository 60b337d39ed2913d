//! The MovieHub publish pipeline.
//!
//! A title goes through resolve -> render -> write page -> merge index ->
//! persist index -> mirror. Local artifacts are the source of truth; the
//! remote store is best-effort replication of them.

pub mod coordinator;
pub mod index;
pub mod mirror;
pub mod site;

pub use coordinator::PublishCoordinator;
pub use index::{merge, IndexRepository, IndexSession};
pub use mirror::{Artifact, Mirror, MirrorJob, MirrorReport, MirrorState};
pub use site::SiteLayout;
