//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use moviehub_publish::PublishCoordinator;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The publish pipeline for the served site.
    pub coordinator: Arc<PublishCoordinator>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(coordinator: PublishCoordinator) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            start_time: Instant::now(),
        }
    }
}
