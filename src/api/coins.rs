//! Coin Listing Endpoints
//! Mission: Serve the market listing and exchange directory

use crate::error::Result;
use crate::models::CoinSummary;
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct CoinsQuery {
    pub search: Option<String>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

/// GET /api/coins?search=&per_page=&page=
///
/// Market-cap-ordered coin listing. The search filter is applied after the
/// upstream fetch, as a case-insensitive substring match on the coin name.
pub async fn get_coins(
    Query(params): Query<CoinsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<CoinSummary>>> {
    let per_page = params.per_page.unwrap_or(50);
    let page = params.page.unwrap_or(1);

    let mut markets = state.market.fetch_markets(per_page, page).await?;

    if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        markets.retain(|coin| coin.name.to_lowercase().contains(&needle));
    }

    let summaries = markets.into_iter().map(CoinSummary::from_market).collect();
    Ok(Json(summaries))
}

/// GET /api/exchanges — upstream exchange directory, passed through.
pub async fn get_exchanges(State(state): State<AppState>) -> Result<Json<Value>> {
    let exchanges = state.market.fetch_exchange_list().await?;
    Ok(Json(exchanges))
}
