//! Metadata resolution for MovieHub.
//!
//! Turns a free-form title into normalized [`MovieMetadata`] by asking an
//! external catalog. The first search hit wins.
//!
//! [`MovieMetadata`]: moviehub_core::MovieMetadata

pub mod genres;
pub mod mock;
pub mod resolver;
pub mod tmdb;

pub use mock::MockResolver;
pub use resolver::MetadataResolver;
pub use tmdb::TmdbResolver;
