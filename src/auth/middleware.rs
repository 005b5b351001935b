//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation

use crate::auth::jwt::JwtHandler;
use crate::error::Error;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Auth middleware that validates JWT bearer tokens.
///
/// On success the decoded `Claims` are inserted into the request extensions
/// for handlers to consume; on failure the request is rejected with the
/// standard 401 JSON body.
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Error> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(Error::Unauthorized)?;

    let claims = jwt_handler
        .validate_token(token)
        .map_err(|_| Error::Unauthorized)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
