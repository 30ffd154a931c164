use crate::filter::{SortOrder, TransactionType};
use crate::graph::EngineHandle;
use crate::period::{DateRange, Period};
use crate::EngineError;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match self {
            EngineError::InvalidPeriod(_) => StatusCode::BAD_REQUEST,
            EngineError::Stopped => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Computation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Read access to the derived view plus the filter setters.
///
/// Setters answer `202 Accepted`; the change shows up in `/view` once the
/// engine has recomputed.
pub fn engine_router<S>(handle: EngineHandle) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/view", get(get_view))
        .route("/view/summary", get(get_summary))
        .route("/view/status", get(get_status))
        .route("/view/refresh", post(refresh))
        .route("/filters", get(get_filters).delete(clear_filters))
        .route("/filters/type", put(set_type))
        .route("/filters/category", put(set_category))
        .route("/filters/range", put(set_range))
        .route("/filters/period", put(set_period))
        .route("/filters/search", put(set_search))
        .route("/filters/sort", put(set_sort))
        .with_state(handle)
}

#[derive(Deserialize)]
struct ViewQuery {
    /// Only return the first `limit` rows.
    limit: Option<usize>,
}

async fn get_view(State(handle): State<EngineHandle>, Query(params): Query<ViewQuery>) -> impl IntoResponse {
    let view = handle.current();
    let mut body = view.as_ref().clone();
    if let Some(limit) = params.limit {
        body.transactions = view.recent(limit).to_vec();
    }
    Json(body)
}

async fn get_summary(State(handle): State<EngineHandle>) -> impl IntoResponse {
    Json(handle.current().summary.clone())
}

async fn get_status(State(handle): State<EngineHandle>) -> impl IntoResponse {
    Json(handle.status())
}

async fn refresh(State(handle): State<EngineHandle>) -> Result<impl IntoResponse, EngineError> {
    handle.refresh()?;
    Ok(StatusCode::ACCEPTED)
}

async fn get_filters(State(handle): State<EngineHandle>) -> impl IntoResponse {
    Json(handle.filter_state())
}

async fn clear_filters(State(handle): State<EngineHandle>) -> Result<impl IntoResponse, EngineError> {
    handle.clear_filters()?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Deserialize)]
struct TypeRequest {
    transaction_type: Option<TransactionType>,
}

async fn set_type(
    State(handle): State<EngineHandle>,
    Json(payload): Json<TypeRequest>,
) -> Result<impl IntoResponse, EngineError> {
    handle.set_type_filter(payload.transaction_type)?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Deserialize)]
struct CategoryRequest {
    category_id: Option<i64>,
}

async fn set_category(
    State(handle): State<EngineHandle>,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse, EngineError> {
    handle.set_category_filter(payload.category_id)?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Deserialize)]
struct RangeRequest {
    range: Option<DateRange>,
}

async fn set_range(
    State(handle): State<EngineHandle>,
    Json(payload): Json<RangeRequest>,
) -> Result<impl IntoResponse, EngineError> {
    handle.set_date_range_filter(payload.range)?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Deserialize)]
struct PeriodRequest {
    period: Option<String>,
}

async fn set_period(
    State(handle): State<EngineHandle>,
    Json(payload): Json<PeriodRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let period = payload.period.as_deref().map(str::parse::<Period>).transpose()?;
    handle.set_period(period)?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
}

async fn set_search(
    State(handle): State<EngineHandle>,
    Json(payload): Json<SearchRequest>,
) -> Result<impl IntoResponse, EngineError> {
    handle.set_search_query(payload.query)?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Deserialize)]
struct SortRequest {
    sort: SortOrder,
}

async fn set_sort(
    State(handle): State<EngineHandle>,
    Json(payload): Json<SortRequest>,
) -> Result<impl IntoResponse, EngineError> {
    handle.set_sort_order(payload.sort)?;
    Ok(StatusCode::ACCEPTED)
}
