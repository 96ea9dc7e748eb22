//! EPUB 3 container writer.
//!
//! Accumulates normalized chapters in sequence order and serializes the
//! whole container in one pass: `mimetype` first (stored), then the
//! container descriptor, package document, NCX, navigation document,
//! stylesheet and one XHTML file per chapter.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::AppError;
use crate::scraping::models::{BookMetadata, ChapterEntry};

const CONTAINER_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

const STYLESHEET: &str = "BODY {color: white;}";

/// EPUB 3 requires dcterms:modified; the scrape is not versioned, so a
/// fixed timestamp keeps the output deterministic.
const MODIFIED: &str = "2024-01-01T00:00:00Z";

struct Chapter {
    index: usize,
    heading: String,
    xhtml: String,
}

pub struct EpubWriter {
    metadata: BookMetadata,
    chapters: Vec<Chapter>,
}

impl EpubWriter {
    pub fn new(metadata: BookMetadata) -> Self {
        Self {
            metadata,
            chapters: Vec::new(),
        }
    }

    /// Appends a normalized chapter fragment. Call order must follow
    /// sequence-index order; the spine is written as accumulated.
    pub fn add_chapter(&mut self, entry: &ChapterEntry, fragment: &str) {
        let heading = entry.heading();
        let xhtml = chapter_document(&heading, &self.metadata.language, fragment);
        self.chapters.push(Chapter {
            index: entry.index,
            heading,
            xhtml,
        });
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// Serializes the container to `dir`, named from the sanitized
    /// "Title - Author" pattern. Returns the filename written.
    pub fn write_file(&self, dir: &Path) -> Result<String, AppError> {
        let filename = self.metadata.filename();
        let file = File::create(dir.join(&filename))?;
        self.write_to(file)?;
        Ok(filename)
    }

    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<(), AppError> {
        let mut zip = ZipWriter::new(writer);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // The mimetype entry must come first and must not be compressed.
        zip.start_file("mimetype", stored)?;
        zip.write_all(b"application/epub+zip")?;

        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(CONTAINER_XML)?;

        zip.start_file("OEBPS/content.opf", deflated)?;
        zip.write_all(self.package_document().as_bytes())?;

        zip.start_file("OEBPS/toc.ncx", deflated)?;
        zip.write_all(self.ncx().as_bytes())?;

        zip.start_file("OEBPS/nav.xhtml", deflated)?;
        zip.write_all(self.nav_document().as_bytes())?;

        zip.start_file("OEBPS/style/nav.css", deflated)?;
        zip.write_all(STYLESHEET.as_bytes())?;

        for chapter in &self.chapters {
            zip.start_file(format!("OEBPS/chap_{}.xhtml", chapter.index), deflated)?;
            zip.write_all(chapter.xhtml.as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }

    fn package_document(&self) -> String {
        let mut opf = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
        );

        opf.push_str(&format!(
            "    <dc:identifier id=\"BookId\">{}</dc:identifier>\n",
            escape_xml(&self.metadata.id)
        ));
        opf.push_str(&format!(
            "    <dc:title>{}</dc:title>\n",
            escape_xml(&self.metadata.title)
        ));
        opf.push_str(&format!(
            "    <dc:creator>{}</dc:creator>\n",
            escape_xml(&self.metadata.author)
        ));
        opf.push_str(&format!(
            "    <dc:language>{}</dc:language>\n",
            escape_xml(&self.metadata.language)
        ));
        opf.push_str(&format!(
            "    <meta property=\"dcterms:modified\">{MODIFIED}</meta>\n"
        ));
        opf.push_str("  </metadata>\n");

        opf.push_str("  <manifest>\n");
        opf.push_str(
            "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
        );
        opf.push_str(
            "    <item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
        );
        opf.push_str(
            "    <item id=\"style_nav\" href=\"style/nav.css\" media-type=\"text/css\"/>\n",
        );
        for chapter in &self.chapters {
            opf.push_str(&format!(
                "    <item id=\"chap_{0}\" href=\"chap_{0}.xhtml\" media-type=\"application/xhtml+xml\"/>\n",
                chapter.index
            ));
        }
        opf.push_str("  </manifest>\n");

        // Reading order: navigation document first, then the chapters
        // in sequence-index order.
        opf.push_str("  <spine toc=\"ncx\">\n");
        opf.push_str("    <itemref idref=\"nav\"/>\n");
        for chapter in &self.chapters {
            opf.push_str(&format!(
                "    <itemref idref=\"chap_{}\"/>\n",
                chapter.index
            ));
        }
        opf.push_str("  </spine>\n</package>\n");

        opf
    }

    fn ncx(&self) -> String {
        let mut ncx = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{id}"/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>{title}</text>
  </docTitle>
  <navMap>
"#,
            id = escape_xml(&self.metadata.id),
            title = escape_xml(&self.metadata.title),
        );

        for (play_order, chapter) in self.chapters.iter().enumerate() {
            ncx.push_str(&format!(
                r#"    <navPoint id="navPoint-{order}" playOrder="{order}">
      <navLabel><text>{label}</text></navLabel>
      <content src="chap_{index}.xhtml"/>
    </navPoint>
"#,
                order = play_order + 1,
                label = escape_xml(&chapter.heading),
                index = chapter.index,
            ));
        }

        ncx.push_str("  </navMap>\n</ncx>\n");
        ncx
    }

    fn nav_document(&self) -> String {
        let mut nav = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head>
  <title>{title}</title>
  <link rel="stylesheet" type="text/css" href="style/nav.css"/>
</head>
<body>
  <nav epub:type="toc" id="toc">
    <ol>
"#,
            title = escape_xml(&self.metadata.title),
        );

        for chapter in &self.chapters {
            nav.push_str(&format!(
                "      <li><a href=\"chap_{}.xhtml\">{}</a></li>\n",
                chapter.index,
                escape_xml(&chapter.heading)
            ));
        }

        nav.push_str("    </ol>\n  </nav>\n</body>\n</html>\n");
        nav
    }
}

fn chapter_document(title: &str, language: &str, fragment: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="{language}">
<head>
  <title>{title}</title>
  <link rel="stylesheet" type="text/css" href="style/nav.css"/>
</head>
<body>
{fragment}</body>
</html>
"#,
        language = escape_xml(language),
        title = escape_xml(title),
        fragment = fragment,
    )
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
