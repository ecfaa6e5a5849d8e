use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Asset;

// One observed price for an asset at an instant (epoch millis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PricePoint {
    pub id: Uuid,
    pub timing: i64,
    pub name: String,
    pub price: f64,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePricePoint {
    pub timing: i64,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub recommendation: Option<String>,
}

impl PricePoint {
    pub(crate) fn new(asset: Asset, timing: i64, price: f64, recommendation: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timing,
            name: asset.display_name().to_string(),
            price,
            recommendation,
        }
    }

    pub(crate) fn with_id(id: Uuid, asset: Asset, input: CreatePricePoint) -> Self {
        Self {
            id,
            timing: input.timing,
            name: asset.display_name().to_string(),
            price: input.price,
            recommendation: input.recommendation,
        }
    }
}

impl CreatePricePoint {
    /// Checks the point invariants and resolves the name to a known asset.
    pub fn validate(&self) -> Result<Asset, AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".into()));
        }
        let asset = Asset::resolve(&self.name)?;
        if self.timing <= 0 {
            return Err(AppError::Validation("Timing must be positive".into()));
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(AppError::Validation("Price must be positive".into()));
        }
        Ok(asset)
    }
}
