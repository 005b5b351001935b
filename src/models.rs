//! Core Data Models
//! Mission: Typed views of the CoinGecko wire format and our stored records

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Settlement currency every spread is computed in.
pub const SETTLEMENT_CURRENCY: &str = "USDT";

/// Runtime configuration, sourced from the environment with sane defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_path: String,
    pub jwt_secret: String,
    pub coingecko_api_url: String,
    pub news_source_url: String,
    pub scrape_endpoint_url: String,
    pub scrape_interval_secs: u64,
    pub scheduler_enabled: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./coinlens.db".to_string());

        let jwt_secret = std::env::var("JWT_SECRET")
            .unwrap_or_else(|_| "dev-secret-change-in-production-minimum-32-characters".to_string());

        let coingecko_api_url = std::env::var("COINGECKO_API_URL")
            .unwrap_or_else(|_| "https://api.coingecko.com/api/v3".to_string());

        let news_source_url = std::env::var("NEWS_SOURCE_URL")
            .unwrap_or_else(|_| "https://cointelegraph.com".to_string());

        // One authoritative endpoint for the scheduler. Defaults to this
        // process's own scrape route.
        let scrape_endpoint_url = std::env::var("SCRAPE_ENDPOINT_URL").unwrap_or_else(|_| {
            let host = bind_addr.replace("0.0.0.0", "127.0.0.1");
            format!("http://{host}/api/scrape")
        });

        let scrape_interval_secs = std::env::var("SCRAPE_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);

        let scheduler_enabled = std::env::var("SCHEDULER_ENABLED")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
            .unwrap_or(true);

        Self {
            bind_addr,
            database_path,
            jwt_secret,
            coingecko_api_url,
            news_source_url,
            scrape_endpoint_url,
            scrape_interval_secs,
            scheduler_enabled,
        }
    }
}

/// One venue's quote for a coin, as returned by `/coins/{id}/tickers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub market: Option<TickerMarket>,
    /// Last traded price in the target currency.
    #[serde(default)]
    pub last: Option<f64>,
    #[serde(default)]
    pub trade_url: Option<String>,
}

/// Venue metadata attached to a ticker (logo requires
/// `include_exchange_logo=true` on the request).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerMarket {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

/// Response body of `/coins/{id}/tickers`.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinTickers {
    pub name: String,
    #[serde(default)]
    pub tickers: Vec<Ticker>,
}

/// A computed spread before it is persisted. Identity and timestamp are
/// assigned by the history store on record.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadResult {
    pub coin_name: String,
    pub lowest_exchange: String,
    pub lowest_price: f64,
    pub lowest_trade_url: String,
    pub lowest_logo: String,
    pub highest_exchange: String,
    pub highest_price: f64,
    pub highest_trade_url: String,
    pub highest_logo: String,
    pub price_difference: f64,
    pub percentage_difference: f64,
}

/// A persisted spread computation, owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitrageRecord {
    pub id: String,
    pub user_id: String,
    pub coin_name: String,
    pub lowest_exchange: String,
    pub lowest_price: f64,
    pub lowest_trade_url: String,
    pub lowest_logo: String,
    pub highest_exchange: String,
    pub highest_price: f64,
    pub highest_trade_url: String,
    pub highest_logo: String,
    pub price_difference: f64,
    pub percentage_difference: f64,
    /// Milliseconds since epoch.
    pub timestamp: i64,
}

/// A scraped news article. `url` is the canonical dedup key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    pub author: String,
    pub url: String,
    pub image_url: String,
    /// Milliseconds since epoch; None when the relative-time string could
    /// not be resolved.
    pub published_at: Option<i64>,
}

/// One row of the `/coins/markets` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinMarket {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default)]
    pub sparkline_in_7d: Option<Sparkline>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Sparkline {
    #[serde(default)]
    pub price: Vec<f64>,
}

/// Shape the frontend consumes from `GET /api/coins`.
#[derive(Debug, Clone, Serialize)]
pub struct CoinSummary {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub current_price: f64,
    pub price_change_percentage_24h: f64,
    pub market_cap: f64,
    pub market_cap_rank: u32,
    pub total_volume: f64,
    pub sparkline_in_7d: Sparkline,
}

impl CoinSummary {
    pub fn from_market(coin: CoinMarket) -> Self {
        Self {
            id: coin.id,
            name: coin.name,
            symbol: coin.symbol,
            image_url: coin.image.unwrap_or_default(),
            current_price: coin.current_price.unwrap_or_default(),
            price_change_percentage_24h: round2(
                coin.price_change_percentage_24h.unwrap_or_default(),
            ),
            market_cap: coin.market_cap.unwrap_or_default(),
            market_cap_rank: coin.market_cap_rank.unwrap_or_default(),
            total_volume: coin.total_volume.unwrap_or_default(),
            sparkline_in_7d: coin.sparkline_in_7d.unwrap_or_default(),
        }
    }
}

/// Round to two decimal places, the precision every stored spread uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Current wall-clock time as milliseconds since epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
