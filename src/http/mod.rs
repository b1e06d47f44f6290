mod auth_routes;
mod blog_routes;
mod upload_routes;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, FromRequestParts, State};
use axum::http::{header, request::Parts, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::auth::{Credentials, Identity, Role, TokenStore};
use crate::error::StoreError;
use crate::store::BlogStore;
use crate::uploads::UploadStore;

/// Request bodies (JSON and multipart) are capped well above the
/// per-file upload limit so multi-file uploads fit.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Everything a request handler needs: the persistence core and its
/// collaborators, shared by cheap clone.
#[derive(Clone)]
pub struct AppState {
    pub store: BlogStore,
    pub tokens: Arc<dyn TokenStore>,
    pub uploads: UploadStore,
    pub credentials: Credentials,
}

pub fn router(state: AppState) -> Router {
    let uploads_dir = state.uploads.base_dir().to_path_buf();

    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/login", post(auth_routes::login))
        .route("/api/auth/logout", post(auth_routes::logout))
        .route("/api/auth/check", get(auth_routes::check))
        .route("/api/blogs/admin/all", get(blog_routes::admin_all))
        .route("/api/blogs", post(blog_routes::create))
        // GET addresses a language, PUT/DELETE a blog id; they share the
        // path segment because both live at the same position.
        .route(
            "/api/blogs/{lang}",
            get(blog_routes::public_list)
                .put(blog_routes::update)
                .delete(blog_routes::remove),
        )
        .route("/api/blogs/{lang}/{id}", get(blog_routes::public_get))
        .route("/api/upload/single", post(upload_routes::single))
        .route("/api/upload/multiple", post(upload_routes::multiple))
        .route("/api/upload/list", get(upload_routes::list))
        .route("/api/upload/{filename}", delete(upload_routes::remove))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.ping()?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Extractor gating a handler on a valid bearer token.
pub struct AuthUser(pub Identity);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or(ApiError::Unauthorized("missing bearer token"))?;
        let identity = state
            .tokens
            .validate(token)
            .ok_or(ApiError::Unauthorized("invalid or expired token"))?;
        Ok(AuthUser(identity))
    }
}

/// Extractor additionally requiring the admin role.
pub struct AdminUser(pub Identity);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;
        if identity.role != Role::Admin {
            return Err(ApiError::Forbidden("admin role required"));
        }
        Ok(AdminUser(identity))
    }
}

#[derive(Debug)]
pub enum ApiError {
    Store(StoreError),
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Store(err) => {
                let status = match &err {
                    StoreError::Validation(_) | StoreError::InvalidLanguage(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    StoreError::NotFound => StatusCode::NOT_FOUND,
                    StoreError::Conflict(_) => StatusCode::CONFLICT,
                    StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    // Storage details stay in the log, not the response.
                    log::error!("storage error: {err}");
                    (status, "internal storage error".to_string())
                } else {
                    (status, err.to_string())
                }
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
