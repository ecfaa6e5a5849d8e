use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::price_queries;
use crate::models::{PricePoint, PriceExtreme, Recency};
use crate::store::{PricePointStore, StoreResult};

/// PostgreSQL-backed store. Ties are broken by `timing ASC, id ASC`.
#[derive(Clone)]
pub struct PgPricePointStore {
    pool: PgPool,
}

impl PgPricePointStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl PricePointStore for PgPricePointStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<PricePoint>> {
        price_queries::fetch_one(&self.pool, id).await
    }

    async fn find_all(&self) -> StoreResult<Vec<PricePoint>> {
        price_queries::fetch_all(&self.pool).await
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Vec<PricePoint>> {
        price_queries::fetch_by_name(&self.pool, name).await
    }

    async fn find_by_timing_between(&self, start_millis: i64, end_millis: i64) -> StoreResult<Vec<PricePoint>> {
        price_queries::fetch_timing_between(&self.pool, start_millis, end_millis).await
    }

    async fn find_price_extreme(&self, name: &str, extreme: PriceExtreme) -> StoreResult<Option<PricePoint>> {
        price_queries::fetch_price_extreme(&self.pool, name, extreme).await
    }

    async fn find_timing_extreme(&self, name: Option<&str>, recency: Recency) -> StoreResult<Option<PricePoint>> {
        price_queries::fetch_timing_extreme(&self.pool, name, recency).await
    }

    async fn find_grouped_price_extremes(&self, extreme: PriceExtreme) -> StoreResult<Vec<PricePoint>> {
        price_queries::fetch_grouped_price_extremes(&self.pool, extreme).await
    }

    async fn find_grouped_timing_extremes(&self, recency: Recency) -> StoreResult<Vec<PricePoint>> {
        price_queries::fetch_grouped_timing_extremes(&self.pool, recency).await
    }

    async fn insert(&self, point: PricePoint) -> StoreResult<PricePoint> {
        price_queries::insert(&self.pool, &point).await
    }

    async fn insert_many(&self, points: Vec<PricePoint>) -> StoreResult<u64> {
        price_queries::insert_many(&self.pool, &points).await
    }

    async fn replace(&self, point: PricePoint) -> StoreResult<Option<PricePoint>> {
        price_queries::update(&self.pool, &point).await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<u64> {
        price_queries::delete(&self.pool, id).await
    }
}
