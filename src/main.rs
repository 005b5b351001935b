//! CoinLens - Crypto Tracking Backend
//! Mission: Price listings, per-user arbitrage spreads, and a scraped news feed

use anyhow::{Context, Result};
use coinlens_backend::{
    arbitrage::HistoryStore,
    auth::{AuthState, JwtHandler, UserStore},
    build_router,
    models::Config,
    news::NewsStore,
    scheduler::ScrapeScheduler,
    scrapers::{CoinGeckoClient, NewsScraper},
    AppState,
};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 CoinLens backend starting");

    // All stores share one SQLite file; each opens its own connection.
    let user_store = Arc::new(UserStore::new(&config.database_path)?);
    let jwt_handler = Arc::new(JwtHandler::new(config.jwt_secret.clone()));
    let auth_state = AuthState::new(user_store, jwt_handler.clone());
    info!("🔐 Authentication initialized at: {}", config.database_path);

    let history = Arc::new(HistoryStore::new(&config.database_path)?);
    let news_store = Arc::new(NewsStore::new(&config.database_path)?);
    info!("💾 Existing news articles in database: {}", news_store.len());

    let market = Arc::new(CoinGeckoClient::new(&config.coingecko_api_url)?);
    let news_scraper = Arc::new(NewsScraper::new(
        &config.news_source_url,
        news_store.clone(),
    )?);

    let state = AppState {
        market,
        history,
        news_store,
        news_scraper,
    };

    let app = build_router(state, auth_state, jwt_handler);

    // The scheduler posts our own scrape endpoint; it must outlive serve().
    let mut scheduler = ScrapeScheduler::new(
        &config.scrape_endpoint_url,
        Duration::from_secs(config.scrape_interval_secs),
    )?;
    if config.scheduler_enabled {
        scheduler.start();
    }

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
