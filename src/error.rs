use std::path::PathBuf;

use thiserror::Error;

use crate::scraping::browser::FetchError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("WebDriver binary not found: {}", .0.display())]
    DriverNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Browser automation error: {0}")]
    Browser(String),

    #[error("Page fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Chapter {index} could not be fetched: {source}")]
    ChapterFetch { index: usize, source: FetchError },

    #[error("Book metadata could not be parsed: {0}")]
    MetadataParse(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected page structure: {0}")]
    Structure(String),

    #[error("EPUB container error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
