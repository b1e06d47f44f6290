use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::{bearer_token, ApiError, AppState, AuthUser};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let identity = state
        .credentials
        .verify(&req.username, &req.password)
        .ok_or(ApiError::Unauthorized("invalid username or password"))?;
    let token = state.tokens.issue(identity.clone());
    log::info!("login: {}", identity.username);
    Ok(Json(json!({ "token": token, "user": identity })))
}

/// Revokes the presented token. Succeeds even without one so a client
/// that lost its token can still clear its session.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<serde_json::Value> {
    if let Some(token) = bearer_token(&headers) {
        state.tokens.revoke(token);
    }
    Json(json!({ "success": true }))
}

pub async fn check(AuthUser(identity): AuthUser) -> Json<serde_json::Value> {
    Json(json!({ "user": identity }))
}
