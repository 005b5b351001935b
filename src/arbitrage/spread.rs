//! Spread Calculator
//! Mission: Find the cheapest and priciest venue for a coin and quantify the gap

use crate::error::{Error, Result};
use crate::models::{round2, SpreadResult, Ticker, SETTLEMENT_CURRENCY};
use tracing::debug;

/// A ticker that survived filtering: quoted in the settlement currency with a
/// usable price and a named venue.
struct RankedTicker {
    exchange: String,
    price: f64,
    trade_url: String,
    logo: String,
}

fn filter_ticker(ticker: &Ticker) -> Option<RankedTicker> {
    if ticker.target.as_deref() != Some(SETTLEMENT_CURRENCY) {
        return None;
    }
    let price = ticker.last.filter(|p| p.is_finite() && *p > 0.0)?;
    let market = ticker.market.as_ref()?;
    let exchange = market.name.as_deref().filter(|n| !n.is_empty())?.to_string();

    Some(RankedTicker {
        exchange,
        price,
        trade_url: ticker.trade_url.clone().unwrap_or_default(),
        logo: market.logo.clone().unwrap_or_default(),
    })
}

/// Compute the lowest/highest venue spread over `tickers`.
///
/// Tickers not quoted in USDT, without a price, or without a venue name are
/// silently dropped. Fails with `NotFound` when nothing survives the filter.
/// With a single surviving ticker both sides are the same venue and the
/// differences are zero. Ties between equal prices keep insertion order
/// (stable sort).
pub fn compute_spread(coin_name: &str, tickers: &[Ticker]) -> Result<SpreadResult> {
    let mut ranked: Vec<RankedTicker> = tickers.iter().filter_map(filter_ticker).collect();

    if ranked.is_empty() {
        return Err(Error::NotFound(format!(
            "No {SETTLEMENT_CURRENCY} tickers found"
        )));
    }

    ranked.sort_by(|a, b| a.price.total_cmp(&b.price));

    debug!(
        coin = coin_name,
        candidates = ranked.len(),
        "ranked tickers for spread"
    );

    let lowest = ranked.first().expect("non-empty after filter");
    let highest = ranked.last().expect("non-empty after filter");

    let price_difference = round2(highest.price - lowest.price);
    let percentage_difference = round2((highest.price - lowest.price) / lowest.price * 100.0);

    Ok(SpreadResult {
        coin_name: coin_name.to_string(),
        lowest_exchange: lowest.exchange.clone(),
        lowest_price: lowest.price,
        lowest_trade_url: lowest.trade_url.clone(),
        lowest_logo: lowest.logo.clone(),
        highest_exchange: highest.exchange.clone(),
        highest_price: highest.price,
        highest_trade_url: highest.trade_url.clone(),
        highest_logo: highest.logo.clone(),
        price_difference,
        percentage_difference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TickerMarket;

    fn ticker(exchange: &str, price: f64, target: &str) -> Ticker {
        Ticker {
            base: Some("BTC".to_string()),
            target: Some(target.to_string()),
            market: Some(TickerMarket {
                name: Some(exchange.to_string()),
                identifier: Some(exchange.to_lowercase()),
                logo: Some(format!("https://logos.test/{}.png", exchange.to_lowercase())),
            }),
            last: Some(price),
            trade_url: Some(format!("https://{}.test/trade", exchange.to_lowercase())),
        }
    }

    #[test]
    fn two_venue_spread() {
        let tickers = vec![ticker("Alpha", 100.0, "USDT"), ticker("Beta", 105.0, "USDT")];
        let spread = compute_spread("Bitcoin", &tickers).unwrap();

        assert_eq!(spread.lowest_exchange, "Alpha");
        assert_eq!(spread.lowest_price, 100.0);
        assert_eq!(spread.highest_exchange, "Beta");
        assert_eq!(spread.highest_price, 105.0);
        assert_eq!(spread.price_difference, 5.0);
        assert_eq!(spread.percentage_difference, 5.0);
    }

    #[test]
    fn highest_never_below_lowest() {
        let tickers = vec![
            ticker("A", 103.2, "USDT"),
            ticker("B", 99.7, "USDT"),
            ticker("C", 101.4, "USDT"),
            ticker("D", 99.9, "USDT"),
        ];
        let spread = compute_spread("Bitcoin", &tickers).unwrap();
        assert!(spread.highest_price >= spread.lowest_price);
        assert_eq!(spread.lowest_exchange, "B");
        assert_eq!(spread.highest_exchange, "A");
        assert_eq!(
            spread.percentage_difference,
            round2((103.2 - 99.7) / 99.7 * 100.0)
        );
    }

    #[test]
    fn no_usdt_tickers_is_not_found() {
        let tickers = vec![ticker("Alpha", 100.0, "USD"), ticker("Beta", 105.0, "EUR")];
        let err = compute_spread("Bitcoin", &tickers).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn empty_list_is_not_found() {
        let err = compute_spread("Bitcoin", &[]).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn single_survivor_yields_zero_spread() {
        let tickers = vec![ticker("Solo", 42.0, "USDT"), ticker("Other", 41.0, "USD")];
        let spread = compute_spread("Bitcoin", &tickers).unwrap();

        assert_eq!(spread.lowest_exchange, "Solo");
        assert_eq!(spread.highest_exchange, "Solo");
        assert_eq!(spread.price_difference, 0.0);
        assert_eq!(spread.percentage_difference, 0.0);
    }

    #[test]
    fn tickers_without_price_or_venue_are_dropped() {
        let mut no_price = ticker("NoPrice", 0.0, "USDT");
        no_price.last = None;
        let mut zero_price = ticker("ZeroPrice", 0.0, "USDT");
        zero_price.last = Some(0.0);
        let mut no_market = ticker("NoMarket", 101.0, "USDT");
        no_market.market = None;

        let tickers = vec![no_price, zero_price, no_market, ticker("Kept", 100.0, "USDT")];
        let spread = compute_spread("Bitcoin", &tickers).unwrap();
        assert_eq!(spread.lowest_exchange, "Kept");
        assert_eq!(spread.highest_exchange, "Kept");
    }

    #[test]
    fn equal_prices_keep_insertion_order() {
        let tickers = vec![
            ticker("First", 100.0, "USDT"),
            ticker("Second", 100.0, "USDT"),
        ];
        let spread = compute_spread("Bitcoin", &tickers).unwrap();
        assert_eq!(spread.lowest_exchange, "First");
        assert_eq!(spread.highest_exchange, "Second");
    }

    #[test]
    fn differences_are_rounded_to_two_decimals() {
        let tickers = vec![
            ticker("Low", 3.333, "USDT"),
            ticker("High", 3.444, "USDT"),
        ];
        let spread = compute_spread("Bitcoin", &tickers).unwrap();
        assert_eq!(spread.price_difference, 0.11);
        assert_eq!(
            spread.percentage_difference,
            round2((3.444 - 3.333) / 3.333 * 100.0)
        );
    }

    #[test]
    fn missing_trade_url_and_logo_default_to_empty() {
        let mut bare = ticker("Bare", 50.0, "USDT");
        bare.trade_url = None;
        if let Some(m) = bare.market.as_mut() {
            m.logo = None;
        }
        let spread = compute_spread("Bitcoin", &[bare]).unwrap();
        assert_eq!(spread.lowest_trade_url, "");
        assert_eq!(spread.lowest_logo, "");
    }
}
