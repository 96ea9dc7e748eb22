use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Deserialize;

use super::models::BookMetadata;
use crate::error::AppError;

/// The book's language is not exposed in the structured-data block, so
/// it is fixed the way the site's catalogue is.
const LANGUAGE: &str = "en";

static LD_JSON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

/// Typed view of the parts of the ld+json block we rely on.
#[derive(Debug, Deserialize)]
struct LdBook {
    name: String,
    author: LdAuthor,
    #[serde(rename = "mainEntityOfPage")]
    main_entity_of_page: String,
}

#[derive(Debug, Deserialize)]
struct LdAuthor {
    name: String,
}

/// Extracts book metadata from the landing page markup. Metadata is
/// load-bearing for every later step (filename, cache directory, EPUB
/// identifier), so any absence or malformation here is unrecovered.
pub fn parse_metadata(html: &str) -> Result<BookMetadata, AppError> {
    let document = Html::parse_document(html);

    let script = document.select(&LD_JSON).next().ok_or_else(|| {
        AppError::MetadataParse("no structured-data block on the landing page".to_string())
    })?;

    let text = script.text().collect::<String>();
    let blocks: Vec<LdBook> = serde_json::from_str(text.trim())?;
    let book = blocks.into_iter().next().ok_or_else(|| {
        AppError::MetadataParse("structured-data block is empty".to_string())
    })?;

    let id = book
        .main_entity_of_page
        .trim_end_matches('/')
        .rsplit('_')
        .next()
        .unwrap_or_default()
        .to_string();
    if id.is_empty() {
        return Err(AppError::MetadataParse(format!(
            "no book id in mainEntityOfPage '{}'",
            book.main_entity_of_page
        )));
    }

    Ok(BookMetadata {
        title: book.name,
        author: book.author.name,
        language: LANGUAGE.to_string(),
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANDING_PAGE: &str = r#"
        <html><head>
        <script type="application/ld+json">
        [{"name": "The Long Road",
          "author": {"name": "A. Writer"},
          "mainEntityOfPage": "https://www.webnovel.com/book/the-long-road_14527104/"}]
        </script>
        </head><body></body></html>
    "#;

    #[test]
    fn metadata_is_extracted_from_structured_data() {
        let metadata = parse_metadata(LANDING_PAGE).unwrap();
        assert_eq!(metadata.title, "The Long Road");
        assert_eq!(metadata.author, "A. Writer");
        assert_eq!(metadata.language, "en");
        assert_eq!(metadata.id, "14527104");
    }

    #[test]
    fn missing_block_is_a_parse_failure() {
        let result = parse_metadata("<html><body><p>nothing here</p></body></html>");
        assert!(matches!(result, Err(AppError::MetadataParse(_))));
    }

    #[test]
    fn malformed_block_is_a_parse_failure() {
        let html = r#"<script type="application/ld+json">{not json}</script>"#;
        assert!(matches!(parse_metadata(html), Err(AppError::Json(_))));
    }

    #[test]
    fn empty_block_is_a_parse_failure() {
        let html = r#"<script type="application/ld+json">[]</script>"#;
        assert!(matches!(parse_metadata(html), Err(AppError::MetadataParse(_))));
    }

    #[test]
    fn book_id_ignores_trailing_slash() {
        let html = r#"
            <script type="application/ld+json">
            [{"name": "T", "author": {"name": "A"},
              "mainEntityOfPage": "https://www.webnovel.com/book/t_999/"}]
            </script>
        "#;
        assert_eq!(parse_metadata(html).unwrap().id, "999");
    }
}
