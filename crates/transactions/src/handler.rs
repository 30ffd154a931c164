use crate::models::RawCreateTransactionRequest;
use crate::service::{TransactionError, TransactionInput, TransactionService};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use common::AppState;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for TransactionError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            TransactionError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            TransactionError::NotFound => (StatusCode::NOT_FOUND, "Transaction not found".to_string()),
            TransactionError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

impl From<RawCreateTransactionRequest> for TransactionInput {
    fn from(raw: RawCreateTransactionRequest) -> Self {
        TransactionInput {
            amount: raw.amount,
            description: raw.description,
            date: raw.date,
            category_id: raw.category_id,
            is_expense: raw.is_expense,
            is_favorite: raw.is_favorite,
        }
    }
}

#[derive(Deserialize)]
pub struct FavoriteRequest {
    pub is_favorite: bool,
}

pub fn transactions_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route("/{id}", get(get_transaction).put(update_transaction).delete(delete_transaction))
        .route("/{id}/favorite", put(set_favorite))
        .with_state(state)
}

async fn list_transactions(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, TransactionError> {
    Ok(Json(TransactionService::list_transactions(&state.db).await?))
}

async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, TransactionError> {
    Ok(Json(TransactionService::get_transaction(&state.db, id).await?))
}

async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RawCreateTransactionRequest>,
) -> Result<impl IntoResponse, TransactionError> {
    let id = TransactionService::create_transaction(&state.db, payload.into())
        .await
        .map_err(|e| {
            tracing::error!("create_transaction error: {:?}", e);
            e
        })?;

    let transaction = TransactionService::get_transaction(&state.db, id).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<RawCreateTransactionRequest>,
) -> Result<impl IntoResponse, TransactionError> {
    let transaction = TransactionService::update_transaction(&state.db, id, payload.into()).await?;
    Ok(Json(transaction))
}

async fn set_favorite(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<FavoriteRequest>,
) -> Result<impl IntoResponse, TransactionError> {
    TransactionService::set_favorite(&state.db, id, payload.is_favorite).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, TransactionError> {
    TransactionService::delete_transaction(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
