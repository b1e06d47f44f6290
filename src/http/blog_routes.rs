use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::model::{Blog, Language, NewBlog, PublicBlog, UpdateBlog};

use super::{ApiError, AppState, AuthUser};

pub async fn admin_all(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Blog>>, ApiError> {
    Ok(Json(state.store.get_all_for_admin()?))
}

pub async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(new): Json<NewBlog>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.store.create(&new)?;
    log::info!("blog {id} created by {}", user.username);
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn public_list(
    State(state): State<AppState>,
    Path(lang): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let lang: Language = lang.parse()?;
    let list = state.store.get_public(lang)?;
    Ok(Json(json!({
        "chrome": chrome(lang),
        "list": list,
    })))
}

pub async fn public_get(
    State(state): State<AppState>,
    Path((lang, id)): Path<(String, i64)>,
) -> Result<Json<PublicBlog>, ApiError> {
    let lang: Language = lang.parse()?;
    Ok(Json(state.store.get_public_by_id(lang, id)?))
}

pub async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateBlog>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.update(id, &update)?;
    log::info!("blog {id} updated by {}", user.username);
    Ok(Json(json!({ "id": id })))
}

pub async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.delete(id)?;
    log::info!("blog {id} deleted by {}", user.username);
    Ok(Json(json!({ "id": id })))
}

/// Localized labels the public site renders around the blog list.
/// Computed per request, never stored.
fn chrome(lang: Language) -> serde_json::Value {
    let (search, latest, source, category, all, interview, article, fact) = match lang {
        Language::Ru => (
            "Поиск",
            "Свежие записи",
            "Источник",
            "Категория",
            "Все",
            "Интервью",
            "Статьи",
            "Факты",
        ),
        Language::En => (
            "Search",
            "Latest posts",
            "Source",
            "Category",
            "All",
            "Interview",
            "Articles",
            "Facts",
        ),
        Language::Es => (
            "Buscar",
            "Últimas entradas",
            "Fuente",
            "Categoría",
            "Todo",
            "Entrevista",
            "Artículos",
            "Datos",
        ),
        Language::Fr => (
            "Recherche",
            "Derniers articles",
            "Source",
            "Catégorie",
            "Tout",
            "Entretien",
            "Articles",
            "Faits",
        ),
    };
    json!({
        "search": search,
        "latest-news": latest,
        "source": source,
        "categories": {
            "title": category,
            "type": {
                "all": all,
                "interview": interview,
                "article": article,
                "fact": fact
            }
        }
    })
}
