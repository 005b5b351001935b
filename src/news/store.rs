//! News Article Storage
//! Mission: Keep each scraped article exactly once, keyed by canonical URL

use crate::error::Result;
use crate::models::NewsArticle;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::sync::Arc;
use tracing::{debug, info};

const PAGE_SIZE: usize = 15;

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

-- url is the canonical dedup key; the PRIMARY KEY makes dedup race-safe
-- even when two scrape runs overlap.
CREATE TABLE IF NOT EXISTS news (
    url TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    author TEXT NOT NULL DEFAULT '',
    image_url TEXT NOT NULL DEFAULT '',
    published_at INTEGER
) WITHOUT ROWID;

CREATE INDEX IF NOT EXISTS idx_news_published
    ON news(published_at DESC);
"#;

/// SQLite-backed article store. Articles are write-once: the pipeline never
/// updates or deletes a stored row.
pub struct NewsStore {
    conn: Arc<Mutex<Connection>>,
}

impl NewsStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        info!("📰 News store ready at {db_path}");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// True when an article with this canonical URL is already stored.
    pub fn exists(&self, url: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM news WHERE url = ?1",
            params![url],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Insert the article unless its URL is already present. Returns whether
    /// a row was written. `INSERT OR IGNORE` leans on the primary key, so
    /// concurrent runs racing past an `exists` check still produce one row.
    pub fn insert_if_new(&self, article: &NewsArticle) -> Result<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "INSERT OR IGNORE INTO news (url, title, author, image_url, published_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                article.url,
                article.title,
                article.author,
                article.image_url,
                article.published_at,
            ],
        )?;
        if changed > 0 {
            debug!(url = %article.url, "article stored");
        }
        Ok(changed > 0)
    }

    /// One page of articles, newest published first. Pages are 1-based and
    /// hold 15 articles, matching the feed the UI renders.
    pub fn list_page(&self, page: usize) -> Result<Vec<NewsArticle>> {
        let page = page.max(1);
        let offset = (page - 1) * PAGE_SIZE;

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT url, title, author, image_url, published_at
             FROM news
             ORDER BY published_at DESC
             LIMIT ?1 OFFSET ?2",
        )?;

        let rows = stmt.query_map(params![PAGE_SIZE as i64, offset as i64], |row| {
            Ok(NewsArticle {
                url: row.get(0)?,
                title: row.get(1)?,
                author: row.get(2)?,
                image_url: row.get(3)?,
                published_at: row.get(4)?,
            })
        })?;

        let mut articles = Vec::new();
        for row in rows {
            articles.push(row?);
        }
        Ok(articles)
    }

    pub fn len(&self) -> usize {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM news", [], |row| row.get::<_, i64>(0))
            .unwrap_or(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
