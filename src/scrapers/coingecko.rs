//! CoinGecko Market Data Client
//! Mission: Pull venue tickers, coin listings, and the exchange directory

use crate::error::{Error, Result};
use crate::models::{CoinMarket, CoinTickers};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

const USER_AGENT: &str = "CoinLens/1.0 (Market Data Client)";

/// Thin client over the CoinGecko REST API. Every call is a fresh round-trip:
/// no retry, no caching.
pub struct CoinGeckoClient {
    client: Client,
    api_base: String,
}

impl CoinGeckoClient {
    pub fn new(api_base: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Internal(anyhow::anyhow!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: api_base.into(),
        })
    }

    /// Full ticker list for a coin, venue logos included. Fails with
    /// `Upstream` when the provider is unreachable or non-success, and with
    /// `NotFound` when the provider knows the coin but lists no tickers.
    pub async fn fetch_coin_tickers(&self, coin_id: &str) -> Result<CoinTickers> {
        let url = format!("{}/coins/{}/tickers", self.api_base, coin_id);
        debug!(coin = coin_id, "fetching tickers");

        let response = self
            .client
            .get(&url)
            .query(&[("include_exchange_logo", "true")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "Ticker request for '{coin_id}' returned {}",
                response.status()
            )));
        }

        let tickers: CoinTickers = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to parse ticker response: {e}")))?;

        if tickers.tickers.is_empty() {
            return Err(Error::NotFound("No tickers found".to_string()));
        }

        info!(
            coin = coin_id,
            count = tickers.tickers.len(),
            "fetched tickers"
        );
        Ok(tickers)
    }

    /// Coin market listing ordered by market cap, sparkline included.
    pub async fn fetch_markets(&self, per_page: u32, page: u32) -> Result<Vec<CoinMarket>> {
        let url = format!("{}/coins/markets", self.api_base);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("vs_currency", "usd"),
                ("order", "market_cap_desc"),
                ("per_page", &per_page.to_string()),
                ("page", &page.to_string()),
                ("sparkline", "true"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "Market listing returned {}",
                response.status()
            )));
        }

        let markets: Vec<CoinMarket> = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to parse market listing: {e}")))?;

        debug!(count = markets.len(), page, "fetched coin markets");
        Ok(markets)
    }

    /// Exchange directory, passed through to the caller untyped.
    pub async fn fetch_exchange_list(&self) -> Result<Value> {
        let url = format!("{}/exchanges/list", self.api_base);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "Exchange list returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to parse exchange list: {e}")))
    }
}
