use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::models::{PricePoint, PriceExtreme, Recency};

const COLUMNS: &str = "id, timing, name, price, recommendation";

fn price_order(extreme: PriceExtreme) -> &'static str {
    match extreme {
        PriceExtreme::Max => "price DESC, timing ASC, id ASC",
        PriceExtreme::Min => "price ASC, timing ASC, id ASC",
    }
}

fn timing_order(recency: Recency) -> &'static str {
    match recency {
        Recency::Oldest => "timing ASC, id ASC",
        Recency::Newest => "timing DESC, id ASC",
    }
}

pub async fn fetch_one(pool: &PgPool, id: Uuid) -> Result<Option<PricePoint>, sqlx::Error> {
    sqlx::query_as::<_, PricePoint>(&format!("SELECT {} FROM price_points WHERE id = $1", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<PricePoint>, sqlx::Error> {
    sqlx::query_as::<_, PricePoint>(&format!(
        "SELECT {} FROM price_points ORDER BY timing ASC, id ASC",
        COLUMNS
    ))
    .fetch_all(pool)
    .await
}

pub async fn fetch_by_name(pool: &PgPool, name: &str) -> Result<Vec<PricePoint>, sqlx::Error> {
    sqlx::query_as::<_, PricePoint>(&format!(
        "SELECT {} FROM price_points WHERE name = $1 ORDER BY timing ASC, id ASC",
        COLUMNS
    ))
    .bind(name)
    .fetch_all(pool)
    .await
}

pub async fn fetch_timing_between(
    pool: &PgPool,
    start_millis: i64,
    end_millis: i64,
) -> Result<Vec<PricePoint>, sqlx::Error> {
    sqlx::query_as::<_, PricePoint>(&format!(
        "SELECT {} FROM price_points
         WHERE timing BETWEEN $1 AND $2
         ORDER BY timing ASC, id ASC",
        COLUMNS
    ))
    .bind(start_millis)
    .bind(end_millis)
    .fetch_all(pool)
    .await
}

pub async fn fetch_price_extreme(
    pool: &PgPool,
    name: &str,
    extreme: PriceExtreme,
) -> Result<Option<PricePoint>, sqlx::Error> {
    sqlx::query_as::<_, PricePoint>(&format!(
        "SELECT {} FROM price_points WHERE name = $1 ORDER BY {} LIMIT 1",
        COLUMNS,
        price_order(extreme)
    ))
    .bind(name)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_timing_extreme(
    pool: &PgPool,
    name: Option<&str>,
    recency: Recency,
) -> Result<Option<PricePoint>, sqlx::Error> {
    // NULL name matches every asset
    sqlx::query_as::<_, PricePoint>(&format!(
        "SELECT {} FROM price_points
         WHERE ($1::TEXT IS NULL OR name = $1)
         ORDER BY {} LIMIT 1",
        COLUMNS,
        timing_order(recency)
    ))
    .bind(name)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_grouped_price_extremes(
    pool: &PgPool,
    extreme: PriceExtreme,
) -> Result<Vec<PricePoint>, sqlx::Error> {
    sqlx::query_as::<_, PricePoint>(&format!(
        "SELECT DISTINCT ON (name) {} FROM price_points ORDER BY name, {}",
        COLUMNS,
        price_order(extreme)
    ))
    .fetch_all(pool)
    .await
}

pub async fn fetch_grouped_timing_extremes(
    pool: &PgPool,
    recency: Recency,
) -> Result<Vec<PricePoint>, sqlx::Error> {
    sqlx::query_as::<_, PricePoint>(&format!(
        "SELECT DISTINCT ON (name) {} FROM price_points ORDER BY name, {}",
        COLUMNS,
        timing_order(recency)
    ))
    .fetch_all(pool)
    .await
}

pub async fn insert(pool: &PgPool, point: &PricePoint) -> Result<PricePoint, sqlx::Error> {
    sqlx::query_as::<_, PricePoint>(&format!(
        "INSERT INTO price_points (id, timing, name, price, recommendation)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {}",
        COLUMNS
    ))
    .bind(point.id)
    .bind(point.timing)
    .bind(&point.name)
    .bind(point.price)
    .bind(&point.recommendation)
    .fetch_one(pool)
    .await
}

pub async fn insert_many(pool: &PgPool, points: &[PricePoint]) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await.map_err(|e| {
        error!("Failed to begin transaction for price import: {}", e);
        e
    })?;

    let mut inserted = 0;
    for (i, p) in points.iter().enumerate() {
        let result = sqlx::query(
            "INSERT INTO price_points (id, timing, name, price, recommendation)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(p.id)
        .bind(p.timing)
        .bind(&p.name)
        .bind(p.price)
        .bind(&p.recommendation)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(done) => inserted += done.rows_affected(),
            Err(e) => {
                error!("Failed to insert price point {} ({} at {}, price {}): {}",
                       i, p.name, p.timing, p.price, e);
                return Err(e);
            }
        }
    }

    tx.commit().await.map_err(|e| {
        error!("Failed to commit price import: {}", e);
        e
    })?;
    Ok(inserted)
}

pub async fn update(pool: &PgPool, point: &PricePoint) -> Result<Option<PricePoint>, sqlx::Error> {
    sqlx::query_as::<_, PricePoint>(&format!(
        "UPDATE price_points
         SET timing = $2, name = $3, price = $4, recommendation = $5
         WHERE id = $1
         RETURNING {}",
        COLUMNS
    ))
    .bind(point.id)
    .bind(point.timing)
    .bind(&point.name)
    .bind(point.price)
    .bind(&point.recommendation)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM price_points WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
