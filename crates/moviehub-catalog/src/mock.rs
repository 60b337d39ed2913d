//! In-memory resolver for tests and offline runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use moviehub_core::error::{MovieHubError, Result};
use moviehub_core::MovieMetadata;

use crate::resolver::MetadataResolver;

/// Resolver backed by a fixed title table.
///
/// Lookups are case-insensitive on the requested title. A configurable
/// delay and a forced failure make timeout and outage paths testable.
#[derive(Default)]
pub struct MockResolver {
    entries: Mutex<HashMap<String, MovieMetadata>>,
    delay: Option<Duration>,
    unavailable: bool,
    calls: AtomicUsize,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer lookups of `query` with `meta`.
    pub fn with_movie(self, query: &str, meta: MovieMetadata) -> Self {
        self.insert(query, meta);
        self
    }

    /// Sleep before answering every lookup.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every lookup with `UpstreamUnavailable`.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn insert(&self, query: &str, meta: MovieMetadata) {
        self.entries().insert(query.to_lowercase(), meta);
    }

    /// A panic in another test thread must not hide entries from later calls.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, MovieMetadata>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of lookups served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataResolver for MockResolver {
    async fn lookup(&self, title: &str) -> Result<Option<MovieMetadata>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable {
            return Err(MovieHubError::UpstreamUnavailable(
                "mock catalog offline".to_string(),
            ));
        }

        Ok(self.entries().get(&title.to_lowercase()).cloned())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inception() -> MovieMetadata {
        MovieMetadata {
            id: Some(27205.into()),
            title: "Inception".into(),
            overview: "A thief...".into(),
            release_date: "2010-07-16".into(),
            genres: vec![],
        }
    }

    #[tokio::test]
    async fn test_lookup_case_insensitive() {
        let resolver = MockResolver::new().with_movie("Inception", inception());
        let hit = resolver.lookup("INCEPTION").await.unwrap();
        assert_eq!(hit.unwrap().title, "Inception");
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_lookup_miss() {
        let resolver = MockResolver::new();
        assert!(resolver.lookup("Zzzznonexistentmovie123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_survives_poisoned_lock() {
        let resolver = std::sync::Arc::new(MockResolver::new());
        let poisoner = std::sync::Arc::clone(&resolver);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("poison the entries lock");
        })
        .join();
        assert!(resolver.entries.is_poisoned());

        resolver.insert("Inception", inception());
        let hit = resolver.lookup("inception").await.unwrap();
        assert_eq!(hit.unwrap().title, "Inception");
    }

    #[tokio::test]
    async fn test_unavailable() {
        let resolver = MockResolver::new().unavailable();
        let err = resolver.lookup("Inception").await.unwrap_err();
        assert!(matches!(err, MovieHubError::UpstreamUnavailable(_)));
    }
}
