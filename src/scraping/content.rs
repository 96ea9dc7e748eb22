use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};

use super::models::ChapterEntry;
use crate::error::AppError;

/// Interstitial notice elements injected into the chapter body.
const NOISE_TAG: &str = "pirate";

/// Inline comment-bubble markers.
const NOISE_CLASS: &str = "para-comment";

struct Selectors {
    /// Content paragraph block.
    paragraph: Selector,
    /// Text container nested inside each paragraph block.
    body: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    paragraph: Selector::parse("div.cha-paragraph").unwrap(),
    body: Selector::parse("div.dib.pr").unwrap(),
});

/// Turns raw chapter markup into a clean XHTML fragment: a heading
/// built from the chapter's display number and title, followed by every
/// content paragraph in document order with the noise nodes dropped.
///
/// A paragraph block without its expected text container is a
/// structural fault on this chapter, not a silent skip.
pub fn normalize_chapter(entry: &ChapterEntry, raw: &str) -> Result<String, AppError> {
    let document = Html::parse_document(raw);

    let mut fragment = format!(
        "<center><h2>{}</h2></center>\n",
        escape_text(&entry.heading())
    );

    for paragraph in document.select(&SELECTORS.paragraph) {
        let body = paragraph.select(&SELECTORS.body).next().ok_or_else(|| {
            AppError::Structure(format!(
                "chapter {}: paragraph block is missing its text container",
                entry.index
            ))
        })?;
        serialize_clean(body, &mut fragment);
        fragment.push('\n');
    }

    Ok(fragment)
}

/// Serializes an element subtree as XHTML, skipping noise nodes
/// (zero occurrences is fine).
fn serialize_clean(element: ElementRef<'_>, out: &mut String) {
    if is_noise(&element) {
        return;
    }

    let name = element.value().name();
    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }

    if is_void(name) {
        out.push_str("/>");
        return;
    }
    out.push('>');

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    serialize_clean(child_element, out);
                }
            }
            _ => {}
        }
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn is_noise(element: &ElementRef<'_>) -> bool {
    element.value().name() == NOISE_TAG
        || element.value().classes().any(|class| class == NOISE_CLASS)
}

fn is_void(name: &str) -> bool {
    matches!(name, "br" | "hr" | "img" | "input" | "link" | "meta")
}

fn escape_text(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(input: &str) -> String {
    escape_text(input).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ChapterEntry {
        ChapterEntry {
            index: 1,
            number: "7".to_string(),
            title: "The Crossing".to_string(),
            url: "https://example.com/ch7".to_string(),
        }
    }

    fn chapter_html(paragraphs: &str) -> String {
        format!("<html><body><div class=\"cha-content\">{paragraphs}</div></body></html>")
    }

    #[test]
    fn heading_uses_a_single_consistent_tag() {
        let html = chapter_html("");
        let fragment = normalize_chapter(&entry(), &html).unwrap();
        assert!(fragment.starts_with("<center><h2>7: The Crossing</h2></center>"));
        assert!(!fragment.contains("</h1>"));
    }

    #[test]
    fn paragraphs_are_extracted_in_document_order() {
        let html = chapter_html(
            r#"<div class="cha-paragraph"><div class="dib pr"><p>First.</p></div></div>
               <div class="cha-paragraph"><div class="dib pr"><p>Second.</p></div></div>"#,
        );
        let fragment = normalize_chapter(&entry(), &html).unwrap();
        let first = fragment.find("First.").unwrap();
        let second = fragment.find("Second.").unwrap();
        assert!(first < second);
    }

    #[test]
    fn interstitial_notices_are_dropped() {
        let html = chapter_html(
            r#"<div class="cha-paragraph"><div class="dib pr">
                 <p>Kept.</p><pirate><p>Read this elsewhere!</p></pirate>
               </div></div>"#,
        );
        let fragment = normalize_chapter(&entry(), &html).unwrap();
        assert!(fragment.contains("Kept."));
        assert!(!fragment.contains("pirate"));
        assert!(!fragment.contains("elsewhere"));
    }

    #[test]
    fn comment_markers_are_dropped() {
        let html = chapter_html(
            r#"<div class="cha-paragraph"><div class="dib pr">
                 <p>Text<i class="para-comment">3</i> continues.</p>
               </div></div>"#,
        );
        let fragment = normalize_chapter(&entry(), &html).unwrap();
        assert!(fragment.contains("Text"));
        assert!(fragment.contains("continues."));
        assert!(!fragment.contains("para-comment"));
    }

    #[test]
    fn missing_text_container_is_a_structure_error() {
        let html = chapter_html(r#"<div class="cha-paragraph"><p>bare</p></div>"#);
        assert!(matches!(
            normalize_chapter(&entry(), &html),
            Err(AppError::Structure(_))
        ));
    }

    #[test]
    fn void_elements_are_self_closed() {
        let html = chapter_html(
            r#"<div class="cha-paragraph"><div class="dib pr"><p>a<br>b</p></div></div>"#,
        );
        let fragment = normalize_chapter(&entry(), &html).unwrap();
        assert!(fragment.contains("<br/>"));
    }

    #[test]
    fn text_is_xml_escaped() {
        let html = chapter_html(
            r#"<div class="cha-paragraph"><div class="dib pr"><p>a &lt; b &amp; c</p></div></div>"#,
        );
        let fragment = normalize_chapter(&entry(), &html).unwrap();
        assert!(fragment.contains("a &lt; b &amp; c"));
    }
}
