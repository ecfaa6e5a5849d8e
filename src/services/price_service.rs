use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CreatePricePoint, PricePoint};
use crate::store::PricePointStore;

const BUY: &str = "Buy";

pub async fn list_all(store: &dyn PricePointStore) -> Result<Vec<PricePoint>, AppError> {
    store.find_all().await.map_err(|e| {
        error!("Failed to fetch price points: {}", e);
        AppError::Db(e)
    })
}

pub async fn get_by_id(store: &dyn PricePointStore, id: Uuid) -> Result<PricePoint, AppError> {
    store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No data found for Id:{}", id)))
}

pub async fn create(store: &dyn PricePointStore, input: CreatePricePoint) -> Result<PricePoint, AppError> {
    let asset = input.validate()?;
    let point = PricePoint::new(asset, input.timing, input.price, input.recommendation);
    let stored = store.insert(point).await?;
    info!("Created price point {} for {}", stored.id, stored.name);
    Ok(stored)
}

/// Replaces every field of the point except its id.
pub async fn update(
    store: &dyn PricePointStore,
    id: Uuid,
    input: CreatePricePoint,
) -> Result<PricePoint, AppError> {
    let asset = input.validate()?;
    let replacement = PricePoint::with_id(id, asset, input);
    store
        .replace(replacement)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Crypto not found with id: {}", id)))
}

pub async fn delete(store: &dyn PricePointStore, id: Uuid) -> Result<(), AppError> {
    match store.delete(id).await? {
        0 => Err(AppError::NotFound(format!("Crypto not found with id: {}", id))),
        _ => Ok(()),
    }
}

/// Points annotated with a "Buy" recommendation, any case.
pub async fn recommendations(store: &dyn PricePointStore) -> Result<Vec<PricePoint>, AppError> {
    let points = store.find_all().await?;
    Ok(points
        .into_iter()
        .filter(|p| {
            p.recommendation
                .as_deref()
                .is_some_and(|r| r.eq_ignore_ascii_case(BUY))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryPricePointStore;

    fn input(timing: i64, name: &str, price: f64, recommendation: Option<&str>) -> CreatePricePoint {
        CreatePricePoint {
            timing,
            name: name.to_string(),
            price,
            recommendation: recommendation.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_canonicalizes_name() {
        let store = InMemoryPricePointStore::new();
        let created = create(&store, input(1, "btc", 10.0, None)).await.unwrap();
        assert_eq!(created.name, "Bitcoin");
        assert_eq!(get_by_id(&store, created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_asset() {
        let store = InMemoryPricePointStore::new();
        let result = create(&store, input(1, "Fakecoin", 10.0, None)).await;
        assert!(matches!(result, Err(AppError::UnknownAsset(_))));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_update_preserves_id() {
        let store = InMemoryPricePointStore::new();
        let created = create(&store, input(1, "ETH", 10.0, None)).await.unwrap();

        let updated = update(&store, created.id, input(2, "Ethereum", 12.5, Some("Buy")))
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.timing, 2);
        assert_eq!(updated.price, 12.5);

        let missing = update(&store, Uuid::new_v4(), input(2, "ETH", 1.0, None)).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = InMemoryPricePointStore::new();
        let created = create(&store, input(1, "LTC", 10.0, None)).await.unwrap();
        delete(&store, created.id).await.unwrap();
        assert!(matches!(delete(&store, created.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(get_by_id(&store, created.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_recommendations_match_buy_case_insensitively() {
        let store = InMemoryPricePointStore::new();
        create(&store, input(1, "BTC", 10.0, Some("BUY"))).await.unwrap();
        create(&store, input(2, "BTC", 11.0, Some("Sell"))).await.unwrap();
        create(&store, input(3, "ETH", 12.0, None)).await.unwrap();
        create(&store, input(4, "ETH", 13.0, Some("buy"))).await.unwrap();

        let recommended = recommendations(&store).await.unwrap();
        assert_eq!(recommended.iter().map(|p| p.timing).collect::<Vec<_>>(), vec![1, 4]);
    }
}
