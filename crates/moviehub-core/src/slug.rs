/// Derive the filesystem-safe identifier a movie page is stored under.
///
/// The title is lowercased and every non-alphanumeric character (spaces and
/// punctuation included) is dropped rather than replaced. Distinct titles
/// that differ only in punctuation or spacing therefore collide:
/// "The Matrix" and "the matrix!!" both map to `thematrix`, and the later
/// publish overwrites the earlier page.
pub fn page_identifier(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
