use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::services::csv_import_service::{self, ImportResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/csv", post(upload_csv))
}

/// Accepts a raw CSV body with `timestamp,symbol,price` rows. Bad rows are
/// reported back instead of failing the whole upload.
pub async fn upload_csv(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ImportResult>, AppError> {
    info!("POST /upload/csv - Importing {} bytes", body.len());

    if body.trim().is_empty() {
        return Err(AppError::Validation("CSV body is empty".to_string()));
    }

    let result = csv_import_service::import_csv_str(state.store.as_ref(), &body)
        .await
        .map_err(|e| {
            error!("Failed to import CSV upload: {}", e);
            e
        })?;

    info!(
        "Upload completed: {} price points imported, {} errors",
        result.imported,
        result.errors.len()
    );
    Ok(Json(result))
}
