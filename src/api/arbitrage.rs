//! Arbitrage Endpoints
//! Mission: Compute, list, and delete per-user spread records over HTTP

use crate::arbitrage::compute_spread;
use crate::auth::Claims;
use crate::error::{Error, Result};
use crate::models::{now_millis, ArbitrageRecord};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ArbitrageQuery {
    pub id: Option<String>,
}

/// POST /api/arbitrage?id=<coinId>
///
/// Fetches the coin's tickers, computes the USDT spread, and persists it for
/// the authenticated user.
pub async fn post_arbitrage(
    Query(params): Query<ArbitrageQuery>,
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> Result<Json<ArbitrageRecord>> {
    let coin_id = params
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| Error::Validation("Missing coin id".to_string()))?;

    let tickers = state.market.fetch_coin_tickers(&coin_id).await?;
    let spread = compute_spread(&tickers.name, &tickers.tickers)?;
    let record = state.history.record(&claims.sub, spread, now_millis())?;

    info!(
        user = %claims.sub,
        coin = %record.coin_name,
        spread_pct = record.percentage_difference,
        "arbitrage computed"
    );
    Ok(Json(record))
}

/// GET /api/arbitrage-history
pub async fn get_history(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ArbitrageRecord>>> {
    let records = state.history.list(&claims.sub)?;
    Ok(Json(records))
}

/// DELETE /api/arbitrage-history/:id
pub async fn delete_history(
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> Result<Json<Value>> {
    state.history.delete(&id, &claims.sub)?;
    Ok(Json(json!({ "success": true })))
}
