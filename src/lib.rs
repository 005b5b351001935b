//! CoinLens Backend Library
//!
//! Exposes the service's modules and the router builder so binaries and
//! integration tests share one wiring path.

pub mod api;
pub mod arbitrage;
pub mod auth;
pub mod error;
pub mod middleware;
pub mod models;
pub mod news;
pub mod scheduler;
pub mod scrapers;

use crate::arbitrage::HistoryStore;
use crate::auth::{auth_middleware, AuthState, JwtHandler};
use crate::news::NewsStore;
use crate::scrapers::{CoinGeckoClient, NewsScraper};
use axum::{
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared state handed to every API handler.
#[derive(Clone)]
pub struct AppState {
    pub market: Arc<CoinGeckoClient>,
    pub history: Arc<HistoryStore>,
    pub news_store: Arc<NewsStore>,
    pub news_scraper: Arc<NewsScraper>,
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Assemble the full application router: public routes, JWT-protected
/// routes, and the auth endpoints.
pub fn build_router(
    state: AppState,
    auth_state: AuthState,
    jwt_handler: Arc<JwtHandler>,
) -> Router {
    let auth_router = Router::new()
        .route("/api/auth/signup", post(auth::api::signup))
        .route("/api/auth/login", post(auth::api::login))
        .with_state(auth_state.clone());

    let protected_auth = Router::new()
        .route("/api/auth/me", get(auth::api::get_current_user))
        .route_layer(axum::middleware::from_fn_with_state(
            jwt_handler.clone(),
            auth_middleware,
        ))
        .with_state(auth_state);

    let protected_routes = Router::new()
        .route("/api/arbitrage", post(api::post_arbitrage))
        .route("/api/arbitrage-history", get(api::get_history))
        .route("/api/arbitrage-history/:id", delete(api::delete_history))
        .route_layer(axum::middleware::from_fn_with_state(
            jwt_handler,
            auth_middleware,
        ))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/scrape", post(api::post_scrape))
        .route("/api/news", get(api::get_news))
        .route("/api/coins", get(api::get_coins))
        .route("/api/exchanges", get(api::get_exchanges))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(protected_auth)
        .merge(auth_router)
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .layer(CorsLayer::permissive())
}
