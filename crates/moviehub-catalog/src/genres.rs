//! TMDB's fixed movie genre table.
//!
//! Search results only carry `genre_ids`; the names come from
//! `/genre/movie/list`, which has been stable for years, so it is inlined
//! instead of fetched on every lookup.

const MOVIE_GENRES: &[(u64, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

/// Name of a TMDB movie genre id.
pub fn genre_name(id: u64) -> Option<&'static str> {
    MOVIE_GENRES
        .iter()
        .find(|(gid, _)| *gid == id)
        .map(|(_, name)| *name)
}

/// Map ids to names, preserving order and dropping ids TMDB doesn't list.
pub fn genre_names(ids: &[u64]) -> Vec<String> {
    ids.iter()
        .filter_map(|id| genre_name(*id))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_ids() {
        assert_eq!(genre_name(28), Some("Action"));
        assert_eq!(genre_name(878), Some("Science Fiction"));
    }

    #[test]
    fn test_unknown_ids_are_dropped() {
        assert_eq!(
            genre_names(&[28, 424242, 12]),
            vec!["Action".to_string(), "Adventure".to_string()]
        );
        assert!(genre_names(&[]).is_empty());
    }
}
