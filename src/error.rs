//! Service Error Taxonomy
//! Mission: One error type for every failure the API can surface

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Every failure path in the service maps onto one of these variants.
///
/// `Forbidden` is intentionally surfaced with the same status and body as
/// `NotFound` so callers cannot probe for the existence of records they do
/// not own.
#[derive(Debug)]
pub enum Error {
    /// Missing or malformed request fields (400)
    Validation(String),
    /// Missing or invalid credentials (401)
    Unauthorized,
    /// Empty result set or unknown record (404)
    NotFound(String),
    /// Ownership mismatch, surfaced as 404
    Forbidden,
    /// Resource already exists (409)
    Conflict(String),
    /// Third-party API unreachable or non-success status (500)
    Upstream(String),
    /// News listing page could not be fetched (500)
    Scrape(String),
    /// Storage failure (500)
    Database(rusqlite::Error),
    /// Anything else (500)
    Internal(anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Validation(msg) => write!(f, "{msg}"),
            Error::Unauthorized => write!(f, "Unauthorized"),
            Error::NotFound(msg) => write!(f, "{msg}"),
            Error::Forbidden => write!(f, "Not found or forbidden"),
            Error::Conflict(msg) => write!(f, "{msg}"),
            Error::Upstream(msg) => write!(f, "{msg}"),
            Error::Scrape(msg) => write!(f, "{msg}"),
            Error::Database(e) => write!(f, "Database error: {e}"),
            Error::Internal(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) | Error::Forbidden => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Upstream(_)
            | Error::Scrape(_)
            | Error::Database(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client. Internal detail is logged, not leaked.
    fn public_message(&self) -> String {
        match self {
            Error::Database(_) => "Internal server error".to_string(),
            Error::Internal(_) => "Internal server error".to_string(),
            // NotFound and Forbidden share a body on purpose.
            Error::Forbidden => "Not found or forbidden".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {self:?}");
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Database(e)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Internal(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Upstream(format!("Upstream request failed: {e}"))
    }
}
