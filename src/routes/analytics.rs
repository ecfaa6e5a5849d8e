use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{Asset, NormalizedValues, PriceExtreme, PricePoint, Recency, SortDirection};
use crate::services::analytics_service;
use crate::services::time_window::parse_month;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/min/:name", get(get_min_by_name))
        .route("/max/:name", get(get_max_by_name))
        .route("/max-values", get(get_max_values))
        .route("/min-values", get(get_min_values))
        .route("/oldest", get(get_oldest))
        .route("/newest", get(get_newest))
        .route("/oldest/:name", get(get_oldest_by_name))
        .route("/newest/:name", get(get_newest_by_name))
        .route("/oldest-values", get(get_oldest_values))
        .route("/newest-values", get(get_newest_values))
        .route("/sorted", get(get_oldest_or_newest))
        .route("/series", get(get_sorted_series))
        .route("/normalized-values", get(get_normalized_values))
        .route("/normalized-values/:name", get(get_normalized_values_by_name))
        .route("/oldest/:name/:month", get(get_oldest_by_name_and_month))
        .route("/newest/:name/:month", get(get_newest_by_name_and_month))
        .route("/max/:name/:month", get(get_max_by_name_and_month))
        .route("/min/:name/:month", get(get_min_by_name_and_month))
        .route("/highest-normalization", get(get_highest_normalization))
        .route("/highest-normalization/:name/:days", get(get_highest_normalization_by_days))
        .route("/min/:name/lastNoOfDays/:days", get(get_min_by_name_and_days))
        .route("/max/:name/lastNoOfDays/:days", get(get_max_by_name_and_days))
}

#[derive(Debug, Deserialize)]
struct SortQuery {
    name: String,
    #[serde(rename = "sortDirection")]
    sort_direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: String,
}

fn found(point: Option<PricePoint>, message: impl FnOnce() -> String) -> Result<Json<PricePoint>, AppError> {
    point.map(Json).ok_or_else(|| AppError::NotFound(message()))
}

fn log_failure<T>(route: &str, result: Result<T, AppError>) -> Result<T, AppError> {
    result.map_err(|e| {
        match &e {
            AppError::Db(_) => error!("{} failed: {}", route, e),
            _ => info!("{} rejected: {}", route, e),
        }
        e
    })
}

async fn get_min_by_name(
    Path(name): Path<String>,
    State(state): State<AppState>
) -> Result<Json<PricePoint>, AppError> {
    info!("GET /crypto/min/{} - Lowest price", name);
    let asset = Asset::resolve(&name)?;
    let point = log_failure("min by name", analytics_service::min_by_name(state.store.as_ref(), asset).await)?;
    found(point, || format!("No cryptocurrency found with the name: {}", name))
}

async fn get_max_by_name(
    Path(name): Path<String>,
    State(state): State<AppState>
) -> Result<Json<PricePoint>, AppError> {
    info!("GET /crypto/max/{} - Highest price", name);
    let asset = Asset::resolve(&name)?;
    let point = log_failure("max by name", analytics_service::max_by_name(state.store.as_ref(), asset).await)?;
    found(point, || format!("No cryptocurrency found with the name: {}", name))
}

async fn get_max_values(State(state): State<AppState>) -> Result<Json<Vec<PricePoint>>, AppError> {
    info!("GET /crypto/max-values - Highest price per asset");
    let points = analytics_service::grouped_extremes(state.store.as_ref(), PriceExtreme::Max).await?;
    Ok(Json(points))
}

async fn get_min_values(State(state): State<AppState>) -> Result<Json<Vec<PricePoint>>, AppError> {
    info!("GET /crypto/min-values - Lowest price per asset");
    let points = analytics_service::grouped_extremes(state.store.as_ref(), PriceExtreme::Min).await?;
    Ok(Json(points))
}

async fn get_oldest(State(state): State<AppState>) -> Result<Json<PricePoint>, AppError> {
    info!("GET /crypto/oldest - Oldest price point");
    let point = analytics_service::oldest(state.store.as_ref()).await?;
    found(point, || "No cryptocurrencies found".to_string())
}

async fn get_newest(State(state): State<AppState>) -> Result<Json<PricePoint>, AppError> {
    info!("GET /crypto/newest - Newest price point");
    let point = analytics_service::newest(state.store.as_ref()).await?;
    found(point, || "No cryptocurrencies found".to_string())
}

async fn get_oldest_by_name(
    Path(name): Path<String>,
    State(state): State<AppState>
) -> Result<Json<PricePoint>, AppError> {
    info!("GET /crypto/oldest/{} - Oldest price point", name);
    let asset = Asset::resolve(&name)?;
    let point = analytics_service::oldest_by_name(state.store.as_ref(), asset).await?;
    found(point, || format!("No cryptocurrency found with the name: {}", name))
}

async fn get_newest_by_name(
    Path(name): Path<String>,
    State(state): State<AppState>
) -> Result<Json<PricePoint>, AppError> {
    info!("GET /crypto/newest/{} - Newest price point", name);
    let asset = Asset::resolve(&name)?;
    let point = analytics_service::newest_by_name(state.store.as_ref(), asset).await?;
    found(point, || format!("No cryptocurrency found with the name: {}", name))
}

async fn get_oldest_values(State(state): State<AppState>) -> Result<Json<Vec<PricePoint>>, AppError> {
    info!("GET /crypto/oldest-values - Oldest point per asset");
    let points = analytics_service::grouped_recency(state.store.as_ref(), Recency::Oldest).await?;
    Ok(Json(points))
}

async fn get_newest_values(State(state): State<AppState>) -> Result<Json<Vec<PricePoint>>, AppError> {
    info!("GET /crypto/newest-values - Newest point per asset");
    let points = analytics_service::grouped_recency(state.store.as_ref(), Recency::Newest).await?;
    Ok(Json(points))
}

async fn get_oldest_or_newest(
    Query(params): Query<SortQuery>,
    State(state): State<AppState>
) -> Result<Json<Vec<PricePoint>>, AppError> {
    info!("GET /crypto/sorted - {} ({:?})", params.name, params.sort_direction);
    let asset = Asset::resolve(&params.name)?;
    let direction = SortDirection::lenient(params.sort_direction.as_deref());
    let points = analytics_service::oldest_or_newest(state.store.as_ref(), asset, direction).await?;
    if points.is_empty() {
        return Err(AppError::NotFound(format!("No data found for name: {}", params.name)));
    }
    Ok(Json(points))
}

async fn get_sorted_series(
    Query(params): Query<SortQuery>,
    State(state): State<AppState>
) -> Result<Json<Vec<PricePoint>>, AppError> {
    info!("GET /crypto/series - {} ({:?})", params.name, params.sort_direction);
    let asset = Asset::resolve(&params.name)?;
    let direction = SortDirection::lenient(params.sort_direction.as_deref());
    let points = analytics_service::sorted_by_timing(state.store.as_ref(), asset, direction).await?;
    Ok(Json(points))
}

async fn get_normalized_values(State(state): State<AppState>) -> Result<Json<NormalizedValues>, AppError> {
    info!("GET /crypto/normalized-values - Normalized range per asset");
    let values = analytics_service::normalized_values_all(state.store.as_ref()).await?;
    Ok(Json(values))
}

async fn get_normalized_values_by_name(
    Path(name): Path<String>,
    State(state): State<AppState>
) -> Result<Json<NormalizedValues>, AppError> {
    info!("GET /crypto/normalized-values/{} - Normalized range", name);
    let asset = Asset::resolve(&name)?;
    let values = analytics_service::normalized_values_by_name(state.store.as_ref(), asset).await?;
    Ok(Json(values))
}

async fn get_oldest_by_name_and_month(
    Path((name, month)): Path<(String, i64)>,
    State(state): State<AppState>
) -> Result<Json<PricePoint>, AppError> {
    info!("GET /crypto/oldest/{}/{} - Oldest in month", name, month);
    let asset = Asset::resolve(&name)?;
    let m = parse_month(month)?;
    let point = analytics_service::oldest_by_name_and_month(state.store.as_ref(), asset, m).await?;
    found(point, || format!("No cryptocurrency found with the name: {} and month: {}", name, month))
}

async fn get_newest_by_name_and_month(
    Path((name, month)): Path<(String, i64)>,
    State(state): State<AppState>
) -> Result<Json<PricePoint>, AppError> {
    info!("GET /crypto/newest/{}/{} - Newest in month", name, month);
    let asset = Asset::resolve(&name)?;
    let m = parse_month(month)?;
    let point = analytics_service::newest_by_name_and_month(state.store.as_ref(), asset, m).await?;
    found(point, || format!("No cryptocurrency found with the name: {} and month: {}", name, month))
}

async fn get_max_by_name_and_month(
    Path((name, month)): Path<(String, i64)>,
    State(state): State<AppState>
) -> Result<Json<PricePoint>, AppError> {
    info!("GET /crypto/max/{}/{} - Highest price in month", name, month);
    let asset = Asset::resolve(&name)?;
    let m = parse_month(month)?;
    let point = analytics_service::extreme_by_name_and_month(state.store.as_ref(), asset, m, PriceExtreme::Max).await?;
    found(point, || format!("No cryptocurrency found with the name: {} and month: {}", name, month))
}

async fn get_min_by_name_and_month(
    Path((name, month)): Path<(String, i64)>,
    State(state): State<AppState>
) -> Result<Json<PricePoint>, AppError> {
    info!("GET /crypto/min/{}/{} - Lowest price in month", name, month);
    let asset = Asset::resolve(&name)?;
    let m = parse_month(month)?;
    let point = analytics_service::extreme_by_name_and_month(state.store.as_ref(), asset, m, PriceExtreme::Min).await?;
    found(point, || format!("No cryptocurrency found with the name: {} and month: {}", name, month))
}

async fn get_highest_normalization(
    Query(params): Query<DateQuery>,
    State(state): State<AppState>
) -> Result<Json<PricePoint>, AppError> {
    info!("GET /crypto/highest-normalization?date={}", params.date);
    let point = log_failure(
        "highest normalization for date",
        analytics_service::highest_normalization_for_date(state.store.as_ref(), &params.date).await,
    )?;
    found(point, || {
        format!("No cryptocurrency found with the highest normalization value for the date: {}", params.date)
    })
}

async fn get_highest_normalization_by_days(
    Path((name, days)): Path<(String, i64)>,
    State(state): State<AppState>
) -> Result<Json<PricePoint>, AppError> {
    info!("GET /crypto/highest-normalization/{}/{}", name, days);
    let asset = Asset::resolve(&name)?;
    let point = log_failure(
        "highest normalization by days",
        analytics_service::highest_normalization_by_name_and_days(state.store.as_ref(), asset, days).await,
    )?;
    found(point, || format!("No cryptocurrency found with the name: {} and last number of days: {}", name, days))
}

async fn get_min_by_name_and_days(
    Path((name, days)): Path<(String, i64)>,
    State(state): State<AppState>
) -> Result<Json<PricePoint>, AppError> {
    info!("GET /crypto/min/{}/lastNoOfDays/{}", name, days);
    let asset = Asset::resolve(&name)?;
    let point = analytics_service::min_by_name_and_days(state.store.as_ref(), asset, days).await?;
    found(point, || format!("No cryptocurrency found with the name: {} and last number of days: {}", name, days))
}

async fn get_max_by_name_and_days(
    Path((name, days)): Path<(String, i64)>,
    State(state): State<AppState>
) -> Result<Json<PricePoint>, AppError> {
    info!("GET /crypto/max/{}/lastNoOfDays/{}", name, days);
    let asset = Asset::resolve(&name)?;
    let point = analytics_service::max_by_name_and_days(state.store.as_ref(), asset, days).await?;
    found(point, || format!("No cryptocurrency found with the name: {} and last number of days: {}", name, days))
}
