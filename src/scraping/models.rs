/// Book-level metadata extracted from the landing page's structured-data
/// block. Populated once, immutable thereafter.
#[derive(Debug, Clone)]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    pub language: String,
    pub id: String,
}

impl BookMetadata {
    /// Output filename: sanitized "Title - Author" plus the extension.
    pub fn filename(&self) -> String {
        let title = ascii_only(&self.title);
        let author = ascii_only(&self.author);
        let stem = format!("{} - {}", title.trim(), author.trim());
        format!("{}.epub", sanitize_filename(&stem))
    }
}

/// One entry of the table-of-contents page, before lock filtering.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub number: String,
    pub title: String,
    pub url: String,
    pub locked: bool,
}

/// An accessible chapter. The sequence index is the 1-based position in
/// the post-filter listing; it is the sole ordering key for cache
/// filenames and the final spine.
#[derive(Debug, Clone)]
pub struct ChapterEntry {
    pub index: usize,
    pub number: String,
    pub title: String,
    pub url: String,
}

impl ChapterEntry {
    pub fn heading(&self) -> String {
        format!("{}: {}", self.number, self.title)
    }
}

/// Strips characters forbidden in filenames on common filesystems.
/// Colon becomes an underscore; the rest are removed.
pub fn sanitize_filename(input: &str) -> String {
    input
        .chars()
        .filter_map(|c| match c {
            '\\' | '/' | '*' | '?' | '"' | '<' | '>' | '|' => None,
            ':' => Some('_'),
            other => Some(other),
        })
        .collect()
}

fn ascii_only(input: &str) -> String {
    input.chars().filter(char::is_ascii).collect()
}
