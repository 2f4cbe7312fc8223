use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use shared::*;
use std::sync::Arc;
use crate::catalog::Catalog;
use crate::engine::ReservationEngine;
use crate::error::InventoryError;
use crate::ledger::LedgerQuery;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub ledger: Arc<LedgerQuery>,
    pub engine: Arc<ReservationEngine>,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/:kind/items", get(list_items).post(create_item))
        .route("/:kind/items/:item_id", get(get_item))
        .route("/:kind/items/:item_id/reservations", get(list_item_reservations))
        .route("/:kind/reservations", get(list_reservations).post(reserve))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

fn status_for(err: &InventoryError) -> StatusCode {
    match err {
        InventoryError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        InventoryError::NotFound { .. } => StatusCode::NOT_FOUND,
        InventoryError::InsufficientStock { .. } | InventoryError::ConcurrentConflict { .. } => StatusCode::CONFLICT,
        InventoryError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        InventoryError::ConsistencyHazard { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: InventoryError) -> (StatusCode, Json<ErrorResponse>) {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
            retryable: err.is_retryable(),
        }),
    )
}

pub async fn list_items(
    State(state): State<AppState>,
    Path(kind): Path<StockKind>,
) -> ApiResult<Json<Vec<StockItem>>> {
    state.catalog.list(kind).await.map(Json).map_err(error_response)
}

pub async fn create_item(
    State(state): State<AppState>,
    Path(kind): Path<StockKind>,
    Json(request): Json<CreateItemRequest>,
) -> ApiResult<(StatusCode, Json<StockItem>)> {
    let item = state.catalog.create(kind, request).await.map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path((kind, item_id)): Path<(StockKind, String)>,
) -> ApiResult<Json<StockItem>> {
    state.catalog.get(kind, &item_id).await.map(Json).map_err(error_response)
}

pub async fn list_item_reservations(
    State(state): State<AppState>,
    Path((kind, item_id)): Path<(StockKind, String)>,
) -> ApiResult<Json<Vec<ReservationRecord>>> {
    state.ledger.list_for_item(kind, &item_id).await.map(Json).map_err(error_response)
}

pub async fn list_reservations(
    State(state): State<AppState>,
    Path(kind): Path<StockKind>,
) -> ApiResult<Json<Vec<ReservationRecord>>> {
    state.ledger.list(kind).await.map(Json).map_err(error_response)
}

pub async fn reserve(
    State(state): State<AppState>,
    Path(kind): Path<StockKind>,
    Json(request): Json<ReserveRequest>,
) -> ApiResult<(StatusCode, Json<ReservationRecord>)> {
    let record = state.engine.reserve(kind, request).await.map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn health_check() -> &'static str {
    "OK"
}
