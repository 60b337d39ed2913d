pub mod config;
pub mod error;
pub mod slug;
pub mod types;

pub use config::MovieHubConfig;
pub use error::{MovieHubError, Result};
pub use slug::page_identifier;
pub use types::*;
