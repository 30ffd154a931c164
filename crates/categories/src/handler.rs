use crate::models::{RawCreateCategoryRequest, UpdateCategoryRequest};
use crate::service::{CategoryError, CategoryService};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use common::AppState;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for CategoryError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            CategoryError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            CategoryError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            CategoryError::NotFound => (StatusCode::NOT_FOUND, "Category not found".to_string()),
            CategoryError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

pub fn categories_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/{id}", put(update_category).delete(delete_category).get(get_category))
        .with_state(state)
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> Result<impl IntoResponse, CategoryError> {
    let categories = match params.kind.as_deref() {
        Some("expense") => CategoryService::list_by_type(&state.db, true).await?,
        Some("income") => CategoryService::list_by_type(&state.db, false).await?,
        _ => CategoryService::list_categories(&state.db).await?,
    };
    Ok(Json(categories))
}

async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CategoryError> {
    Ok(Json(CategoryService::get_category(&state.db, id).await?))
}

async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RawCreateCategoryRequest>,
) -> Result<impl IntoResponse, CategoryError> {
    let id = CategoryService::create_category(
        &state.db,
        payload.name,
        payload.icon,
        payload.color,
        payload.is_expense,
    ).await.map_err(|e| {
        tracing::error!("create_category error: {:?}", e);
        e
    })?;

    let category = CategoryService::get_category(&state.db, id).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, CategoryError> {
    CategoryService::update_category(&state.db, id, payload.name, payload.icon, payload.color, payload.is_expense).await?;
    Ok(Json(CategoryService::get_category(&state.db, id).await?))
}

async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, CategoryError> {
    CategoryService::delete_category(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
