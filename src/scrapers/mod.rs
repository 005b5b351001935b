//! Outbound Data Acquisition
//! Mission: Every byte this service pulls from the outside world comes through here

pub mod coingecko; // CoinGecko REST client for tickers, markets, exchanges
pub mod cointelegraph; // News listing scrape pipeline

pub use coingecko::CoinGeckoClient;
pub use cointelegraph::{parse_relative_date, NewsScraper, ScrapeReport};
