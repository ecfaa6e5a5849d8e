//! Storage for price points.
//!
//! The analytics layer only reads through [`PricePointStore`]; the write
//! methods serve point CRUD and CSV ingestion.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{PricePoint, PriceExtreme, Recency};

mod memory;
mod postgres;

pub use memory::InMemoryPricePointStore;
pub use postgres::PgPricePointStore;

pub type StoreResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait PricePointStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<PricePoint>>;

    async fn find_all(&self) -> StoreResult<Vec<PricePoint>>;

    async fn find_by_name(&self, name: &str) -> StoreResult<Vec<PricePoint>>;

    /// Both bounds inclusive.
    async fn find_by_timing_between(&self, start_millis: i64, end_millis: i64) -> StoreResult<Vec<PricePoint>>;

    async fn find_price_extreme(&self, name: &str, extreme: PriceExtreme) -> StoreResult<Option<PricePoint>>;

    /// `None` for `name` searches across every asset.
    async fn find_timing_extreme(&self, name: Option<&str>, recency: Recency) -> StoreResult<Option<PricePoint>>;

    /// One point per name, at that name's highest or lowest price.
    async fn find_grouped_price_extremes(&self, extreme: PriceExtreme) -> StoreResult<Vec<PricePoint>>;

    /// One point per name, at that name's earliest or latest timing.
    async fn find_grouped_timing_extremes(&self, recency: Recency) -> StoreResult<Vec<PricePoint>>;

    async fn insert(&self, point: PricePoint) -> StoreResult<PricePoint>;

    async fn insert_many(&self, points: Vec<PricePoint>) -> StoreResult<u64>;

    /// Replaces the record with the same id. Returns `None` when no such id exists.
    async fn replace(&self, point: PricePoint) -> StoreResult<Option<PricePoint>>;

    /// Returns the number of rows removed.
    async fn delete(&self, id: Uuid) -> StoreResult<u64>;
}
