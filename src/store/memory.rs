use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{PricePoint, PriceExtreme, Recency};
use crate::services::analytics_service::{group_by_name, select_price_extreme, select_timing_extreme};
use crate::store::{PricePointStore, StoreResult};

/// Keeps every point in insertion order. Data is lost on restart.
#[derive(Default)]
pub struct InMemoryPricePointStore {
    points: RwLock<Vec<PricePoint>>,
}

impl InMemoryPricePointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_points(points: Vec<PricePoint>) -> Self {
        Self {
            points: RwLock::new(points),
        }
    }

    pub async fn len(&self) -> usize {
        self.points.read().await.len()
    }
}

#[async_trait]
impl PricePointStore for InMemoryPricePointStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<PricePoint>> {
        let points = self.points.read().await;
        Ok(points.iter().find(|p| p.id == id).cloned())
    }

    async fn find_all(&self) -> StoreResult<Vec<PricePoint>> {
        Ok(self.points.read().await.clone())
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Vec<PricePoint>> {
        let points = self.points.read().await;
        Ok(points.iter().filter(|p| p.name == name).cloned().collect())
    }

    async fn find_by_timing_between(&self, start_millis: i64, end_millis: i64) -> StoreResult<Vec<PricePoint>> {
        let points = self.points.read().await;
        Ok(points
            .iter()
            .filter(|p| p.timing >= start_millis && p.timing <= end_millis)
            .cloned()
            .collect())
    }

    async fn find_price_extreme(&self, name: &str, extreme: PriceExtreme) -> StoreResult<Option<PricePoint>> {
        let points = self.points.read().await;
        Ok(select_price_extreme(points.iter().filter(|p| p.name == name), extreme).cloned())
    }

    async fn find_timing_extreme(&self, name: Option<&str>, recency: Recency) -> StoreResult<Option<PricePoint>> {
        let points = self.points.read().await;
        let matching = points
            .iter()
            .filter(|p| name.map_or(true, |n| p.name == n));
        Ok(select_timing_extreme(matching, recency).cloned())
    }

    async fn find_grouped_price_extremes(&self, extreme: PriceExtreme) -> StoreResult<Vec<PricePoint>> {
        let points = self.points.read().await;
        Ok(group_by_name(points.iter())
            .into_values()
            .filter_map(|group| select_price_extreme(group, extreme).cloned())
            .collect())
    }

    async fn find_grouped_timing_extremes(&self, recency: Recency) -> StoreResult<Vec<PricePoint>> {
        let points = self.points.read().await;
        Ok(group_by_name(points.iter())
            .into_values()
            .filter_map(|group| select_timing_extreme(group, recency).cloned())
            .collect())
    }

    async fn insert(&self, point: PricePoint) -> StoreResult<PricePoint> {
        let mut points = self.points.write().await;
        points.push(point.clone());
        debug!("Stored price point {} ({} total)", point.id, points.len());
        Ok(point)
    }

    async fn insert_many(&self, batch: Vec<PricePoint>) -> StoreResult<u64> {
        let count = batch.len() as u64;
        let mut points = self.points.write().await;
        points.extend(batch);
        debug!("Stored {} price points ({} total)", count, points.len());
        Ok(count)
    }

    async fn replace(&self, point: PricePoint) -> StoreResult<Option<PricePoint>> {
        let mut points = self.points.write().await;
        match points.iter_mut().find(|p| p.id == point.id) {
            Some(slot) => {
                *slot = point.clone();
                Ok(Some(point))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<u64> {
        let mut points = self.points.write().await;
        let before = points.len();
        points.retain(|p| p.id != id);
        Ok((before - points.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Asset;

    fn point(asset: Asset, timing: i64, price: f64) -> PricePoint {
        PricePoint::new(asset, timing, price, None)
    }

    #[tokio::test]
    async fn test_timing_range_is_inclusive() {
        let store = InMemoryPricePointStore::with_points(vec![
            point(Asset::Bitcoin, 100, 1.0),
            point(Asset::Bitcoin, 200, 2.0),
            point(Asset::Bitcoin, 300, 3.0),
        ]);

        let found = store.find_by_timing_between(100, 200).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(store.find_by_timing_between(301, 400).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ties_keep_first_inserted_point() {
        let first = point(Asset::Ethereum, 100, 10.0);
        let second = point(Asset::Ethereum, 200, 10.0);
        let store = InMemoryPricePointStore::with_points(vec![first.clone(), second]);

        let max = store.find_price_extreme("Ethereum", PriceExtreme::Max).await.unwrap();
        let min = store.find_price_extreme("Ethereum", PriceExtreme::Min).await.unwrap();
        assert_eq!(max.unwrap().id, first.id);
        assert_eq!(min.unwrap().id, first.id);
    }

    #[tokio::test]
    async fn test_grouped_extremes_return_one_point_per_name() {
        let store = InMemoryPricePointStore::with_points(vec![
            point(Asset::Bitcoin, 100, 50_000.0),
            point(Asset::Bitcoin, 200, 40_000.0),
            point(Asset::Bitcoin, 300, 50_000.0),
            point(Asset::Ethereum, 150, 3_000.0),
        ]);

        let max = store.find_grouped_price_extremes(PriceExtreme::Max).await.unwrap();
        assert_eq!(max.len(), 2);
        assert_eq!(max[0].name, "Bitcoin");
        assert_eq!(max[0].timing, 100);

        let newest = store.find_grouped_timing_extremes(Recency::Newest).await.unwrap();
        assert_eq!(newest.iter().map(|p| p.timing).collect::<Vec<_>>(), vec![300, 150]);
    }

    #[tokio::test]
    async fn test_replace_and_delete_by_id() {
        let stored = point(Asset::Litecoin, 100, 80.0);
        let store = InMemoryPricePointStore::with_points(vec![stored.clone()]);

        let mut updated = stored.clone();
        updated.price = 90.0;
        assert_eq!(store.replace(updated).await.unwrap().unwrap().price, 90.0);
        assert_eq!(store.find_by_id(stored.id).await.unwrap().unwrap().price, 90.0);

        assert!(store.replace(point(Asset::Litecoin, 1, 1.0)).await.unwrap().is_none());

        assert_eq!(store.delete(stored.id).await.unwrap(), 1);
        assert_eq!(store.delete(stored.id).await.unwrap(), 0);
        assert_eq!(store.len().await, 0);
    }
}
