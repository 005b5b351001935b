//! Authentication API Endpoints
//! Mission: Provide signup and login endpoints

use crate::auth::{
    jwt::JwtHandler,
    models::{Claims, LoginRequest, LoginResponse, SignupRequest, UserResponse},
    user_store::UserStore,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub user_store: Arc<UserStore>,
    pub jwt_handler: Arc<JwtHandler>,
}

impl AuthState {
    pub fn new(user_store: Arc<UserStore>, jwt_handler: Arc<JwtHandler>) -> Self {
        Self {
            user_store,
            jwt_handler,
        }
    }
}

/// Signup endpoint - POST /api/auth/signup
pub async fn signup(
    State(state): State<AuthState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    if payload.username.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(Error::Validation(
            "Username, email, and password are required.".to_string(),
        ));
    }

    let user = state
        .user_store
        .create_user(&payload.username, &payload.email, &payload.password)?;

    Ok((StatusCode::CREATED, Json(UserResponse::from_user(&user))))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    info!("🔐 Login attempt: {}", payload.email);

    let user = state
        .user_store
        .verify_password(&payload.email, &payload.password)?
        .ok_or_else(|| {
            warn!("❌ Failed login attempt: {}", payload.email);
            Error::Unauthorized
        })?;

    let (token, expires_in) = state
        .jwt_handler
        .generate_token(&user)
        .map_err(Error::Internal)?;

    info!("✅ Login successful: {}", user.username);

    Ok(Json(LoginResponse {
        token,
        expires_in,
        user: UserResponse::from_user(&user),
    }))
}

/// Current user endpoint - GET /api/auth/me (behind auth middleware)
pub async fn get_current_user(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>> {
    let user = state
        .user_store
        .get_user_by_id(&claims.sub)?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from_user(&user)))
}
