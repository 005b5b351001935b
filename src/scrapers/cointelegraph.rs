//! Cointelegraph News Scraper
//! Mission: Harvest the news listing into the article store, once per URL

use crate::error::{Error, Result};
use crate::models::NewsArticle;
use crate::news::NewsStore;
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The site rejects default library user agents, so present a browser.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// How many article detail pages may be in flight at once.
const DETAIL_FETCH_CONCURRENCY: usize = 8;

/// What happened to a single listing entry during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// New article stored with its lead image.
    Stored,
    /// New article stored, but the image fetch or extract failed.
    Degraded,
    /// Already present by canonical URL; skipped without re-fetching.
    Duplicate,
    /// Storage failed for this entry.
    Failed,
}

/// Aggregated result of one pipeline run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScrapeReport {
    /// Entries found on the listing page.
    pub discovered: usize,
    /// Entries dropped because they carried no link.
    pub skipped: usize,
    pub stored: usize,
    pub degraded: usize,
    pub duplicates: usize,
    pub failed: usize,
}

impl ScrapeReport {
    fn tally(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Stored => self.stored += 1,
            ItemOutcome::Degraded => self.degraded += 1,
            ItemOutcome::Duplicate => self.duplicates += 1,
            ItemOutcome::Failed => self.failed += 1,
        }
    }
}

/// Fields pulled from one card on the listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingEntry {
    pub title: String,
    pub author: String,
    pub time_text: String,
    pub url: String,
}

/// Scrapes the news listing, resolves each entry, and persists new articles.
pub struct NewsScraper {
    client: Client,
    base_url: String,
    store: Arc<NewsStore>,
}

impl NewsScraper {
    pub fn new(base_url: impl Into<String>, store: Arc<NewsStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Internal(anyhow::anyhow!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            store,
        })
    }

    /// Run the full pipeline once. Only a listing-page fetch failure fails
    /// the run; every per-entry failure is absorbed into the report.
    pub async fn run(&self) -> Result<ScrapeReport> {
        let listing_html = self
            .client
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| Error::Scrape(format!("Failed to fetch news listing: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Scrape(format!("News listing returned error: {e}")))?
            .text()
            .await
            .map_err(|e| Error::Scrape(format!("Failed to read news listing: {e}")))?;

        let (entries, skipped) = extract_entries(&listing_html, &self.base_url);

        let mut report = ScrapeReport {
            discovered: entries.len() + skipped,
            skipped,
            ..Default::default()
        };

        // Detail fetches and store checks run concurrently; a slow or failing
        // entry never blocks the rest of the batch.
        let outcomes: Vec<ItemOutcome> = stream::iter(entries)
            .map(|entry| self.process_entry(entry))
            .buffer_unordered(DETAIL_FETCH_CONCURRENCY)
            .collect()
            .await;

        for outcome in outcomes {
            report.tally(outcome);
        }

        info!(
            discovered = report.discovered,
            stored = report.stored,
            degraded = report.degraded,
            duplicates = report.duplicates,
            skipped = report.skipped,
            failed = report.failed,
            "scrape run complete"
        );
        Ok(report)
    }

    /// Resolve one listing entry end to end. Never propagates: the outcome
    /// records what happened instead.
    async fn process_entry(&self, entry: ListingEntry) -> ItemOutcome {
        // Known URLs are never re-fetched.
        match self.store.exists(&entry.url) {
            Ok(true) => return ItemOutcome::Duplicate,
            Ok(false) => {}
            Err(e) => {
                warn!(url = %entry.url, "existence check failed: {e}");
                return ItemOutcome::Failed;
            }
        }

        let published_at =
            parse_relative_date(&entry.time_text, Utc::now()).map(|dt| dt.timestamp_millis());

        // Image failures degrade the article instead of dropping it.
        let (image_url, degraded) = match self.fetch_image(&entry.url).await {
            Ok(src) => (src, false),
            Err(e) => {
                warn!(url = %entry.url, "image fetch failed: {e}");
                (String::new(), true)
            }
        };

        let article = NewsArticle {
            title: entry.title,
            author: entry.author,
            url: entry.url.clone(),
            image_url,
            published_at,
        };

        match self.store.insert_if_new(&article) {
            // The store's uniqueness constraint may still catch a race that
            // slipped past the existence check above.
            Ok(false) => ItemOutcome::Duplicate,
            Ok(true) if degraded => ItemOutcome::Degraded,
            Ok(true) => ItemOutcome::Stored,
            Err(e) => {
                warn!(url = %entry.url, "store insert failed: {e}");
                ItemOutcome::Failed
            }
        }
    }

    /// First lead image on the article detail page, empty when absent.
    async fn fetch_image(&self, article_url: &str) -> Result<String> {
        let html = self
            .client
            .get(article_url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Upstream(format!("Article page returned error: {e}")))?
            .text()
            .await?;

        Ok(extract_image(&html).unwrap_or_default())
    }
}

/// Pull article entries out of the listing page. Entries without a link are
/// counted but not returned; no partial record is ever stored.
pub fn extract_entries(html: &str, base_url: &str) -> (Vec<ListingEntry>, usize) {
    let article_sel = Selector::parse("article.post-card__article").expect("static selector");
    let title_sel =
        Selector::parse(r#"span[data-testid="post-card-title"]"#).expect("static selector");
    let author_sel = Selector::parse(r#"a[data-testid="post-card-author-link"] span"#)
        .expect("static selector");
    let time_sel = Selector::parse(r#"time[data-testid="post-card-published-date"]"#)
        .expect("static selector");
    // "post-cad__link" is the site's actual test id, typo included.
    let link_sel =
        Selector::parse(r#"a[data-testid="post-cad__link"]"#).expect("static selector");

    let document = Html::parse_document(html);
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for card in document.select(&article_sel) {
        let href = card
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"));

        let Some(href) = href else {
            skipped += 1;
            continue;
        };

        let url = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{base_url}{href}")
        };

        let text_of = |sel: &Selector| {
            card.select(sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default()
        };

        entries.push(ListingEntry {
            title: text_of(&title_sel),
            author: text_of(&author_sel),
            time_text: text_of(&time_sel),
            url,
        });
    }

    debug!(
        found = entries.len(),
        skipped, "extracted listing entries"
    );
    (entries, skipped)
}

/// First `<picture><img>` source on a detail page.
fn extract_image(html: &str) -> Option<String> {
    let img_sel = Selector::parse("picture img").expect("static selector");
    let document = Html::parse_document(html);
    document
        .select(&img_sel)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string)
}

/// Best-effort resolution of the listing's relative-time strings.
///
/// "N minute(s) ..." and "N hour(s) ..." subtract from `now`; a literal
/// month-day-year date ("Jan 5, 2024") parses as that calendar day at UTC
/// midnight; anything else resolves to None rather than an error.
pub fn parse_relative_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.contains("minute") {
        let minutes: i64 = text.split_whitespace().next()?.parse().ok()?;
        return Some(now - chrono::Duration::minutes(minutes));
    }

    if text.contains("hour") {
        let hours: i64 = text.split_whitespace().next()?.parse().ok()?;
        return Some(now - chrono::Duration::hours(hours));
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%b %d, %Y") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const LISTING_FIXTURE: &str = r#"
    <html><body>
      <article class="post-card__article">
        <a data-testid="post-cad__link" href="/news/bitcoin-breaks-out">
          <span data-testid="post-card-title">Bitcoin breaks out</span>
        </a>
        <a data-testid="post-card-author-link" href="/authors/jane"><span>Jane Doe</span></a>
        <time data-testid="post-card-published-date">5 minutes ago</time>
      </article>
      <article class="post-card__article">
        <span data-testid="post-card-title">Entry without a link</span>
        <time data-testid="post-card-published-date">2 hours ago</time>
      </article>
      <article class="post-card__article">
        <a data-testid="post-cad__link" href="https://elsewhere.test/full-url">
          <span data-testid="post-card-title">Absolute link entry</span>
        </a>
        <time data-testid="post-card-published-date">Jan 5, 2024</time>
      </article>
    </body></html>
    "#;

    #[test]
    fn extracts_fields_and_resolves_relative_links() {
        let (entries, skipped) = extract_entries(LISTING_FIXTURE, "https://cointelegraph.com");

        assert_eq!(entries.len(), 2);
        assert_eq!(skipped, 1);

        assert_eq!(entries[0].title, "Bitcoin breaks out");
        assert_eq!(entries[0].author, "Jane Doe");
        assert_eq!(entries[0].time_text, "5 minutes ago");
        assert_eq!(
            entries[0].url,
            "https://cointelegraph.com/news/bitcoin-breaks-out"
        );

        // Absolute hrefs pass through untouched.
        assert_eq!(entries[1].url, "https://elsewhere.test/full-url");
        assert_eq!(entries[1].author, "");
    }

    #[test]
    fn extract_image_takes_first_picture_img() {
        let html = r#"
        <html><body>
          <picture><img src="https://img.test/lead.jpg"></picture>
          <picture><img src="https://img.test/second.jpg"></picture>
        </body></html>
        "#;
        assert_eq!(
            extract_image(html).as_deref(),
            Some("https://img.test/lead.jpg")
        );
        assert_eq!(extract_image("<html><body></body></html>"), None);
    }

    #[test]
    fn minutes_subtract_from_now() {
        let now = Utc::now();
        let resolved = parse_relative_date("5 minutes ago", now).unwrap();
        let expected = now - chrono::Duration::minutes(5);
        assert!((resolved - expected).num_seconds().abs() < 1);
    }

    #[test]
    fn hours_subtract_from_now() {
        let now = Utc::now();
        let resolved = parse_relative_date("2 hours ago", now).unwrap();
        let expected = now - chrono::Duration::hours(2);
        assert!((resolved - expected).num_seconds().abs() < 1);
    }

    #[test]
    fn literal_date_parses_to_utc_midnight() {
        let resolved = parse_relative_date("Jan 5, 2024", Utc::now()).unwrap();
        assert_eq!(resolved, Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn unmatched_formats_resolve_to_none() {
        let now = Utc::now();
        assert_eq!(parse_relative_date("yesterday", now), None);
        assert_eq!(parse_relative_date("", now), None);
        assert_eq!(parse_relative_date("in a while", now), None);
        // Non-numeric leading token with a unit keyword still fails cleanly.
        assert_eq!(parse_relative_date("a few minutes ago", now), None);
    }

    #[test]
    fn singular_units_also_parse() {
        let now = Utc::now();
        let one_min = parse_relative_date("1 minute ago", now).unwrap();
        assert_eq!((now - one_min).num_minutes(), 1);
        let one_hour = parse_relative_date("1 hour ago", now).unwrap();
        assert_eq!((now - one_hour).num_hours(), 1);
    }

    #[test]
    fn report_tally_counts_each_outcome() {
        let mut report = ScrapeReport::default();
        for outcome in [
            ItemOutcome::Stored,
            ItemOutcome::Stored,
            ItemOutcome::Degraded,
            ItemOutcome::Duplicate,
            ItemOutcome::Failed,
        ] {
            report.tally(outcome);
        }
        assert_eq!(report.stored, 2);
        assert_eq!(report.degraded, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.failed, 1);
    }
}
