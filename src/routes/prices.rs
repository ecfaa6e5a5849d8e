use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CreatePricePoint, PricePoint};
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_prices).post(create_price))
        .route("/recommendations", get(get_recommendations))
        .route("/:id", get(get_price).put(update_price).delete(delete_price))
}

pub async fn list_prices(
    State(state): State<AppState>
) -> Result<Json<Vec<PricePoint>>, AppError> {
    info!("GET /crypto - Listing all price points");
    let points = services::price_service::list_all(state.store.as_ref()).await?;
    Ok(Json(points))
}

pub async fn get_price(
    Path(id): Path<Uuid>,
    State(state): State<AppState>
) -> Result<Json<PricePoint>, AppError> {
    info!("GET /crypto/{} - Fetching price point", id);
    let point = services::price_service::get_by_id(state.store.as_ref(), id).await?;
    Ok(Json(point))
}

pub async fn create_price(
    State(state): State<AppState>,
    Json(data): Json<CreatePricePoint>
) -> Result<(StatusCode, Json<PricePoint>), AppError> {
    info!("POST /crypto - Creating price point for {}", data.name);
    let point = services::price_service::create(state.store.as_ref(), data).await
        .map_err(|e| {
            error!("Failed to create price point: {}", e);
            e
        })?;
    Ok((StatusCode::CREATED, Json(point)))
}

pub async fn update_price(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(data): Json<CreatePricePoint>
) -> Result<Json<PricePoint>, AppError> {
    info!("PUT /crypto/{} - Replacing price point", id);
    let point = services::price_service::update(state.store.as_ref(), id, data).await
        .map_err(|e| {
            error!("Failed to update price point {}: {}", id, e);
            e
        })?;
    Ok(Json(point))
}

pub async fn delete_price(
    Path(id): Path<Uuid>,
    State(state): State<AppState>
) -> Result<StatusCode, AppError> {
    info!("DELETE /crypto/{} - Deleting price point", id);
    services::price_service::delete(state.store.as_ref(), id).await
        .map_err(|e| {
            error!("Failed to delete price point {}: {}", id, e);
            e
        })?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_recommendations(
    State(state): State<AppState>
) -> Result<Json<Vec<PricePoint>>, AppError> {
    info!("GET /crypto/recommendations - Fetching recommended price points");
    let points = services::price_service::recommendations(state.store.as_ref()).await?;
    Ok(Json(points))
}
