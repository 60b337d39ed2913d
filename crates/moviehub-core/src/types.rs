use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Identity
// =============================================================================

/// Stable key assigned by the external catalog to a title.
///
/// TMDB hands out integers; other catalogs may use opaque strings. Both
/// serialize as their natural JSON type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogId {
    Numeric(u64),
    Text(String),
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogId::Numeric(n) => write!(f, "{}", n),
            CatalogId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for CatalogId {
    fn from(n: u64) -> Self {
        CatalogId::Numeric(n)
    }
}

impl From<&str> for CatalogId {
    fn from(s: &str) -> Self {
        CatalogId::Text(s.to_string())
    }
}

/// Opaque version token of a blob in the remote store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteRevision(pub String);

impl RemoteRevision {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Catalog metadata
// =============================================================================

/// Normalized result of a catalog lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieMetadata {
    pub id: Option<CatalogId>,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    /// `YYYY-MM-DD` as reported by the catalog, or empty.
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl MovieMetadata {
    /// Four-digit release year, or an empty string when the catalog did not
    /// report a usable date.
    pub fn year(&self) -> String {
        let year: String = self.release_date.chars().take(4).collect();
        if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
            year
        } else {
            String::new()
        }
    }
}

// =============================================================================
// Index
// =============================================================================

/// One published movie as stored in the aggregate index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CatalogId>,
    pub title: String,
    /// Display label: genres joined with " / ", empty when there are none.
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub year: String,
    /// Site-relative path of the rendered detail page.
    #[serde(default)]
    pub page: String,
}

impl MovieRecord {
    /// Build the index entry for resolved metadata whose page lives at `page`.
    pub fn from_metadata(meta: &MovieMetadata, page: impl Into<String>) -> Self {
        Self {
            id: meta.id.clone(),
            title: meta.title.clone(),
            genre: meta.genres.join(" / "),
            genres: meta.genres.clone(),
            description: meta.overview.clone(),
            year: meta.year(),
            page: page.into(),
        }
    }

    /// Whether `other` denotes the same movie.
    ///
    /// Catalog identifiers decide when both sides carry one. Otherwise the
    /// title, compared case-insensitively, is the key.
    pub fn same_movie(&self, other: &MovieRecord) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.title.to_lowercase() == other.title.to_lowercase(),
        }
    }
}

/// Ordered list of published movies. Insertion order is preserved.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieIndex {
    records: Vec<MovieRecord>,
}

impl MovieIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<MovieRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MovieRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MovieRecord> {
        self.records.iter()
    }

    /// Position of the entry denoting the same movie as `record`.
    ///
    /// An exact identifier match wins over a title match, so a record never
    /// collapses onto a different catalog entry that happens to share its
    /// title with an unidentified incumbent.
    pub fn position_of(&self, record: &MovieRecord) -> Option<usize> {
        if let Some(id) = &record.id {
            if let Some(pos) = self
                .records
                .iter()
                .position(|r| r.id.as_ref() == Some(id))
            {
                return Some(pos);
            }
        }
        self.records.iter().position(|r| r.same_movie(record))
    }

    /// Insert or replace `record` in place.
    ///
    /// Returns `true` when the index content changed.
    pub fn upsert(&mut self, record: MovieRecord) -> bool {
        match self.position_of(&record) {
            Some(pos) => {
                let slot = &mut self.records[pos];
                if *slot == record {
                    false
                } else {
                    *slot = record;
                    true
                }
            }
            None => {
                self.records.push(record);
                true
            }
        }
    }
}

impl IntoIterator for MovieIndex {
    type Item = MovieRecord;
    type IntoIter = std::vec::IntoIter<MovieRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a MovieIndex {
    type Item = &'a MovieRecord;
    type IntoIter = std::slice::Iter<'a, MovieRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// =============================================================================
// Publish results
// =============================================================================

/// Outcome of a successful publish.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    /// The index gained or updated an entry.
    Published,
    /// The movie was already published with identical fields.
    Unchanged,
}

/// State of remote replication for one publish.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RemoteStatus {
    /// Every artifact matches the remote store.
    Succeeded,
    /// Replication was handed to a background job.
    Pending { job_id: Uuid },
    /// At least one artifact could not be replicated; see warnings.
    Failed,
    /// Remote replication is switched off in configuration.
    Disabled,
}

/// Structured result relayed to whoever triggered the publish.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublishResult {
    pub status: PublishStatus,
    /// Catalog identifier of the resolved movie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CatalogId>,
    /// Resolved title.
    pub title: String,
    /// Filesystem-safe identifier the page is stored under.
    pub page_id: String,
    /// Site-relative path of the page.
    pub page: String,
    pub index_changed: bool,
    pub remote: RemoteStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub published_at: DateTime<Utc>,
}
