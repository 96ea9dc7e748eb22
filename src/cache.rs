use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// On-disk snapshots of raw chapter markup: one directory per book
/// (named by the book's unique id), one file per chapter (named by its
/// 1-based sequence index). Entries are never expired or validated; a
/// present file is trusted as complete.
pub struct ChapterCache {
    dir: PathBuf,
}

impl ChapterCache {
    pub fn open(root: &Path, book_id: &str) -> io::Result<Self> {
        let dir = root.join(book_id);
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn load(&self, index: usize) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path(index)) {
            Ok(html) => Ok(Some(html)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn store(&self, index: usize, html: &str) -> io::Result<()> {
        fs::write(self.path(index), html)
    }

    fn path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("chapter_{index}.html"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_the_book_directory() {
        let root = tempfile::tempdir().unwrap();
        let _cache = ChapterCache::open(root.path(), "14527104").unwrap();
        assert!(root.path().join("14527104").is_dir());
    }

    #[test]
    fn stored_chapters_are_read_back_verbatim() {
        let root = tempfile::tempdir().unwrap();
        let cache = ChapterCache::open(root.path(), "book").unwrap();

        cache.store(3, "<html><body>three</body></html>").unwrap();
        assert_eq!(
            cache.load(3).unwrap().as_deref(),
            Some("<html><body>three</body></html>")
        );
        assert!(root.path().join("book").join("chapter_3.html").is_file());
    }

    #[test]
    fn missing_chapters_load_as_none() {
        let root = tempfile::tempdir().unwrap();
        let cache = ChapterCache::open(root.path(), "book").unwrap();
        assert!(cache.load(1).unwrap().is_none());
    }

    #[test]
    fn filenames_use_the_sequence_index() {
        let root = tempfile::tempdir().unwrap();
        let cache = ChapterCache::open(root.path(), "book").unwrap();
        cache.store(1, "one").unwrap();
        cache.store(2, "two").unwrap();
        assert_eq!(cache.load(1).unwrap().as_deref(), Some("one"));
        assert_eq!(cache.load(2).unwrap().as_deref(), Some("two"));
    }
}
