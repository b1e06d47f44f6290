use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde_json::json;

use crate::uploads::StoredImage;

use super::{AdminUser, ApiError, AppState, AuthUser};

/// Maximum number of files accepted by the multiple-upload endpoint.
const MAX_FILES: usize = 10;

pub async fn single(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<StoredImage>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(bad_multipart)?;
        let stored = state.uploads.store(&filename, &bytes)?;
        log::info!("image {} uploaded by {}", stored.filename, user.username);
        return Ok(Json(stored));
    }
    Err(ApiError::BadRequest("missing 'image' field".to_string()))
}

pub async fn multiple(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<StoredImage>>, ApiError> {
    let mut stored = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() != Some("images") {
            continue;
        }
        if stored.len() == MAX_FILES {
            return Err(ApiError::BadRequest(format!(
                "at most {MAX_FILES} images per request"
            )));
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(bad_multipart)?;
        stored.push(state.uploads.store(&filename, &bytes)?);
    }
    if stored.is_empty() {
        return Err(ApiError::BadRequest("missing 'images' fields".to_string()));
    }
    log::info!("{} images uploaded by {}", stored.len(), user.username);
    Ok(Json(stored))
}

pub async fn remove(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.uploads.remove(&filename)?;
    log::info!("image {filename} deleted by {}", user.username);
    Ok(Json(json!({ "deleted": filename })))
}

pub async fn list(
    _user: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredImage>>, ApiError> {
    Ok(Json(state.uploads.list()?))
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(err.to_string())
}
