use std::path::Path;
use std::time::Duration;

use rand::Rng;
use tokio::io::BufReader;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::cache::ChapterCache;
use crate::config::RunConfig;
use crate::epub::EpubWriter;
use crate::error::AppError;
use crate::scraping::models::ChapterEntry;
use crate::scraping::{catalog, content, login, metadata, FetchError, Session};

pub struct App {
    config: RunConfig,
    session: Option<Session>,
}

impl App {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Runs the whole pipeline and returns the output filename. The
    /// browser session is released on both the success and error paths.
    pub async fn run(&mut self) -> Result<String, AppError> {
        info!("Opening browser session");
        self.session = Some(Session::open(&self.config).await?);

        let result = self.run_pipeline().await;
        self.close_session().await;
        result
    }

    async fn run_pipeline(&mut self) -> Result<String, AppError> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| AppError::Browser("session not initialized".to_string()))?;

        let mut stdin = BufReader::new(tokio::io::stdin());
        login::wait_for_login(session, &mut stdin).await?;

        info!("Fetching book metadata");
        let landing = session.render(&self.config.story_url).await?;
        let book = metadata::parse_metadata(&landing)?;
        info!(
            title = %book.title,
            author = %book.author,
            id = %book.id,
            "Book metadata extracted"
        );

        let cache = if self.config.cache_enabled {
            Some(ChapterCache::open(Path::new("."), &book.id)?)
        } else {
            None
        };

        let catalog_url = format!("{}/catalog", self.config.story_url);
        let listing = session.render(&catalog_url).await?;
        let entries = catalog::parse_catalog(&listing)?;
        let total = entries.len();
        let chapters = catalog::unlocked_chapters(entries);
        info!(
            "Total chapters: {total}, unlocked: {} ({} locked)",
            chapters.len(),
            total - chapters.len()
        );

        let mut writer = EpubWriter::new(book);
        let count = chapters.len();

        for chapter in &chapters {
            info!(
                "[{}/{count}] {}: {}",
                chapter.index, chapter.number, chapter.title
            );

            let (raw, cache_hit) = self
                .fetch_chapter(session, chapter, cache.as_ref())
                .await?;
            let fragment = content::normalize_chapter(chapter, &raw)?;
            writer.add_chapter(chapter, &fragment);

            if let Some(delay) =
                inter_chapter_delay(&self.config, chapter.index == count, cache_hit)
            {
                info!(
                    "Waiting {}s before the next chapter to reduce site load",
                    delay.as_secs()
                );
                sleep(delay).await;
            }
        }

        let filename = writer.write_file(Path::new("."))?;
        info!("{} chapters written", writer.chapter_count());
        println!("Finished, EPUB created as {filename}");
        Ok(filename)
    }

    async fn fetch_chapter(
        &self,
        session: &Session,
        entry: &ChapterEntry,
        cache: Option<&ChapterCache>,
    ) -> Result<(String, bool), AppError> {
        cached_or_fetch(cache, entry, || session.render(&entry.url)).await
    }

    /// Releases the browser session, if one is open. Idempotent.
    pub async fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                warn!("failed to release the browser session: {e}");
            }
        }
    }
}

/// Returns the chapter's raw markup and whether it came from the cache.
/// A cached snapshot short-circuits the fetch entirely; on a live fetch
/// the snapshot is persisted before returning, when caching is enabled.
async fn cached_or_fetch<F, Fut>(
    cache: Option<&ChapterCache>,
    entry: &ChapterEntry,
    fetch: F,
) -> Result<(String, bool), AppError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<String, FetchError>>,
{
    if let Some(cache) = cache {
        if let Some(html) = cache.load(entry.index)? {
            debug!("chapter {} read from cache", entry.index);
            return Ok((html, true));
        }
    }

    let html = fetch().await.map_err(|source| AppError::ChapterFetch {
        index: entry.index,
        source,
    })?;

    if let Some(cache) = cache {
        cache.store(entry.index, &html)?;
    }

    Ok((html, false))
}

/// Politeness delay between live chapter fetches. Skipped for cache hits
/// and after the final chapter; otherwise drawn uniformly from the
/// mode's bounds.
fn inter_chapter_delay(config: &RunConfig, is_last: bool, cache_hit: bool) -> Option<Duration> {
    if is_last || cache_hit {
        return None;
    }
    let (low, high) = config.delay_bounds();
    let seconds = rand::thread_rng().gen_range(low..=high);
    Some(Duration::from_secs(seconds))
}
