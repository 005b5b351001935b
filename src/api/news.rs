//! News Endpoints
//! Mission: Trigger the scrape pipeline and serve the article feed

use crate::error::Result;
use crate::models::NewsArticle;
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// POST /api/scrape
///
/// Runs the scrape pipeline synchronously. Fails (500) only when the listing
/// page itself cannot be fetched; per-entry failures are absorbed into the
/// report.
pub async fn post_scrape(State(state): State<AppState>) -> Result<Json<Value>> {
    let report = state.news_scraper.run().await?;
    Ok(Json(json!({
        "message": "Scraping completed",
        "report": report,
    })))
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub page: Option<usize>,
}

/// GET /api/news?page=<n> — 15 articles per page, newest first.
pub async fn get_news(
    Query(params): Query<NewsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<NewsArticle>>> {
    let page = params.page.unwrap_or(1);
    let articles = state.news_store.list_page(page)?;
    Ok(Json(articles))
}
