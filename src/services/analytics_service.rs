use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::Month;
use tracing::debug;

use crate::errors::AppError;
use crate::models::{Asset, NormalizedValues, PriceExtreme, PricePoint, Recency, SortDirection};
use crate::services::time_window::{self, TimeWindow};
use crate::store::PricePointStore;

// ---------------------------------------------------------------------------
// Pure selection over point collections
// ---------------------------------------------------------------------------

/// Keeps the earliest element unless a later one is strictly better, so ties
/// resolve to iteration order.
fn first_best<'a, I, F>(points: I, mut better: F) -> Option<&'a PricePoint>
where
    I: IntoIterator<Item = &'a PricePoint>,
    F: FnMut(&PricePoint, &PricePoint) -> bool,
{
    points.into_iter().fold(None, |best, candidate| match best {
        Some(current) if !better(candidate, current) => Some(current),
        _ => Some(candidate),
    })
}

pub fn select_price_extreme<'a, I>(points: I, extreme: PriceExtreme) -> Option<&'a PricePoint>
where
    I: IntoIterator<Item = &'a PricePoint>,
{
    let wanted = match extreme {
        PriceExtreme::Max => Ordering::Greater,
        PriceExtreme::Min => Ordering::Less,
    };
    first_best(points, |candidate, current| candidate.price.total_cmp(&current.price) == wanted)
}

pub fn select_timing_extreme<'a, I>(points: I, recency: Recency) -> Option<&'a PricePoint>
where
    I: IntoIterator<Item = &'a PricePoint>,
{
    let wanted = match recency {
        Recency::Oldest => Ordering::Less,
        Recency::Newest => Ordering::Greater,
    };
    first_best(points, |candidate, current| candidate.timing.cmp(&current.timing) == wanted)
}

pub fn group_by_name<'a, I>(points: I) -> BTreeMap<&'a str, Vec<&'a PricePoint>>
where
    I: IntoIterator<Item = &'a PricePoint>,
{
    points.into_iter().fold(BTreeMap::new(), |mut groups, point| {
        groups.entry(point.name.as_str()).or_insert_with(Vec::new).push(point);
        groups
    })
}

/// `(max - min) / min` per name. A name is left out when its minimum price is zero.
pub fn normalized_values(points: &[PricePoint]) -> NormalizedValues {
    group_by_name(points)
        .into_iter()
        .filter_map(|(name, group)| {
            let min = group.iter().map(|p| p.price).reduce(f64::min)?;
            let max = group.iter().map(|p| p.price).reduce(f64::max)?;
            if min == 0.0 {
                return None;
            }
            Some((name.to_string(), (max - min) / min))
        })
        .collect()
}

/// Name with the largest ratio; ties keep the alphabetically first name.
pub fn highest_normalization(values: &NormalizedValues) -> Option<(&str, f64)> {
    let mut best: Option<(&str, f64)> = None;
    for (name, &ratio) in values {
        if best.map_or(true, |(_, current)| ratio > current) {
            best = Some((name.as_str(), ratio));
        }
    }
    best
}

fn in_window<'a>(points: &'a [PricePoint], window: &'a TimeWindow) -> impl Iterator<Item = &'a PricePoint> {
    points.iter().filter(move |p| window.contains(p.timing))
}

// ---------------------------------------------------------------------------
// Extremes and recency
// ---------------------------------------------------------------------------

pub async fn min_by_name(store: &dyn PricePointStore, asset: Asset) -> Result<Option<PricePoint>, AppError> {
    Ok(store.find_price_extreme(asset.display_name(), PriceExtreme::Min).await?)
}

pub async fn max_by_name(store: &dyn PricePointStore, asset: Asset) -> Result<Option<PricePoint>, AppError> {
    Ok(store.find_price_extreme(asset.display_name(), PriceExtreme::Max).await?)
}

pub async fn grouped_extremes(
    store: &dyn PricePointStore,
    extreme: PriceExtreme,
) -> Result<Vec<PricePoint>, AppError> {
    Ok(store.find_grouped_price_extremes(extreme).await?)
}

pub async fn grouped_recency(store: &dyn PricePointStore, recency: Recency) -> Result<Vec<PricePoint>, AppError> {
    Ok(store.find_grouped_timing_extremes(recency).await?)
}

pub async fn oldest(store: &dyn PricePointStore) -> Result<Option<PricePoint>, AppError> {
    Ok(store.find_timing_extreme(None, Recency::Oldest).await?)
}

pub async fn newest(store: &dyn PricePointStore) -> Result<Option<PricePoint>, AppError> {
    Ok(store.find_timing_extreme(None, Recency::Newest).await?)
}

pub async fn oldest_by_name(store: &dyn PricePointStore, asset: Asset) -> Result<Option<PricePoint>, AppError> {
    Ok(store.find_timing_extreme(Some(asset.display_name()), Recency::Oldest).await?)
}

pub async fn newest_by_name(store: &dyn PricePointStore, asset: Asset) -> Result<Option<PricePoint>, AppError> {
    Ok(store.find_timing_extreme(Some(asset.display_name()), Recency::Newest).await?)
}

/// Single-element result: the oldest point for `asc`, the newest for `desc`.
pub async fn oldest_or_newest(
    store: &dyn PricePointStore,
    asset: Asset,
    direction: SortDirection,
) -> Result<Vec<PricePoint>, AppError> {
    let point = store
        .find_timing_extreme(Some(asset.display_name()), direction.recency())
        .await?;
    Ok(point.into_iter().collect())
}

/// Every point for the asset ordered by timing. Equal timings keep store order.
pub async fn sorted_by_timing(
    store: &dyn PricePointStore,
    asset: Asset,
    direction: SortDirection,
) -> Result<Vec<PricePoint>, AppError> {
    let mut points = store.find_by_name(asset.display_name()).await?;
    match direction {
        SortDirection::Asc => points.sort_by_key(|p| p.timing),
        SortDirection::Desc => points.sort_by(|a, b| b.timing.cmp(&a.timing)),
    }
    Ok(points)
}

// ---------------------------------------------------------------------------
// Calendar month
// ---------------------------------------------------------------------------

async fn timing_extreme_in_window(
    store: &dyn PricePointStore,
    asset: Asset,
    window: TimeWindow,
    recency: Recency,
) -> Result<Option<PricePoint>, AppError> {
    let points = store.find_by_name(asset.display_name()).await?;
    Ok(select_timing_extreme(in_window(&points, &window), recency).cloned())
}

async fn price_extreme_by_name_in_window(
    store: &dyn PricePointStore,
    asset: Asset,
    window: TimeWindow,
    extreme: PriceExtreme,
) -> Result<Option<PricePoint>, AppError> {
    let points = store.find_by_name(asset.display_name()).await?;
    Ok(select_price_extreme(in_window(&points, &window), extreme).cloned())
}

pub async fn oldest_by_name_and_month(
    store: &dyn PricePointStore,
    asset: Asset,
    month: Month,
) -> Result<Option<PricePoint>, AppError> {
    let window = time_window::month_window(month)?;
    timing_extreme_in_window(store, asset, window, Recency::Oldest).await
}

pub async fn newest_by_name_and_month(
    store: &dyn PricePointStore,
    asset: Asset,
    month: Month,
) -> Result<Option<PricePoint>, AppError> {
    let window = time_window::month_window(month)?;
    timing_extreme_in_window(store, asset, window, Recency::Newest).await
}

pub async fn extreme_by_name_and_month(
    store: &dyn PricePointStore,
    asset: Asset,
    month: Month,
    extreme: PriceExtreme,
) -> Result<Option<PricePoint>, AppError> {
    let window = time_window::month_window(month)?;
    price_extreme_by_name_in_window(store, asset, window, extreme).await
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

pub async fn normalized_values_all(store: &dyn PricePointStore) -> Result<NormalizedValues, AppError> {
    let points = store.find_all().await?;
    Ok(normalized_values(&points))
}

pub async fn normalized_values_by_name(
    store: &dyn PricePointStore,
    asset: Asset,
) -> Result<NormalizedValues, AppError> {
    let points = store.find_by_name(asset.display_name()).await?;
    Ok(normalized_values(&points))
}

/// Normalizes every point in the window, picks the name with the highest
/// ratio and returns the first point of that name inside the window.
async fn highest_normalization_in_window(
    store: &dyn PricePointStore,
    window: TimeWindow,
) -> Result<Option<PricePoint>, AppError> {
    let points = store
        .find_by_timing_between(window.start_millis, window.end_millis)
        .await?;
    let values = normalized_values(&points);

    let Some((name, ratio)) = highest_normalization(&values) else {
        return Ok(None);
    };
    debug!("Highest normalization in window {:?}: {} ({})", window, name, ratio);

    Ok(points.iter().find(|p| p.name == name).cloned())
}

pub async fn highest_normalization_for_date(
    store: &dyn PricePointStore,
    date: &str,
) -> Result<Option<PricePoint>, AppError> {
    let window = time_window::day_window(time_window::parse_date(date)?)?;
    highest_normalization_in_window(store, window).await
}

/// The asset only has to be valid; selection runs across every asset in the window.
pub async fn highest_normalization_by_name_and_days(
    store: &dyn PricePointStore,
    _asset: Asset,
    days: i64,
) -> Result<Option<PricePoint>, AppError> {
    let window = time_window::trailing_days_window(days)?;
    highest_normalization_in_window(store, window).await
}

// ---------------------------------------------------------------------------
// Trailing days
// ---------------------------------------------------------------------------

async fn price_extreme_in_range(
    store: &dyn PricePointStore,
    asset: Asset,
    window: TimeWindow,
    extreme: PriceExtreme,
) -> Result<Option<PricePoint>, AppError> {
    let points = store
        .find_by_timing_between(window.start_millis, window.end_millis)
        .await?;
    let matching = points.iter().filter(|p| p.name == asset.display_name());
    Ok(select_price_extreme(matching, extreme).cloned())
}

pub async fn min_by_name_and_days(
    store: &dyn PricePointStore,
    asset: Asset,
    days: i64,
) -> Result<Option<PricePoint>, AppError> {
    let window = time_window::trailing_days_window(days)?;
    price_extreme_in_range(store, asset, window, PriceExtreme::Min).await
}

pub async fn max_by_name_and_days(
    store: &dyn PricePointStore,
    asset: Asset,
    days: i64,
) -> Result<Option<PricePoint>, AppError> {
    let window = time_window::trailing_days_window(days)?;
    price_extreme_in_range(store, asset, window, PriceExtreme::Max).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryPricePointStore;

    fn point(asset: Asset, timing: i64, price: f64) -> PricePoint {
        PricePoint::new(asset, timing, price, None)
    }

    fn scenario() -> Vec<PricePoint> {
        vec![
            point(Asset::Bitcoin, 100, 50_000.0),
            point(Asset::Bitcoin, 200, 40_000.0),
            point(Asset::Ethereum, 150, 3_000.0),
        ]
    }

    #[tokio::test]
    async fn test_reference_scenario() {
        let store = InMemoryPricePointStore::with_points(scenario());

        let min = min_by_name(&store, Asset::Bitcoin).await.unwrap().unwrap();
        let max = max_by_name(&store, Asset::Bitcoin).await.unwrap().unwrap();
        assert_eq!(min.price, 40_000.0);
        assert_eq!(max.price, 50_000.0);

        let oldest = oldest(&store).await.unwrap().unwrap();
        let newest = newest(&store).await.unwrap().unwrap();
        assert_eq!((oldest.name.as_str(), oldest.timing), ("Bitcoin", 100));
        assert_eq!((newest.name.as_str(), newest.timing), ("Bitcoin", 200));

        let values = normalized_values_all(&store).await.unwrap();
        assert_eq!(values["Bitcoin"], 0.25);
        assert_eq!(values["Ethereum"], 0.0);
    }

    #[tokio::test]
    async fn test_ticker_and_display_name_share_a_series() {
        let store = InMemoryPricePointStore::with_points(scenario());
        let by_ticker = min_by_name(&store, Asset::resolve("BTC").unwrap()).await.unwrap();
        let by_name = min_by_name(&store, Asset::resolve("Bitcoin").unwrap()).await.unwrap();
        assert_eq!(by_ticker, by_name);
    }

    #[tokio::test]
    async fn test_missing_data_is_absent_not_error() {
        let store = InMemoryPricePointStore::new();
        assert!(min_by_name(&store, Asset::Ripple).await.unwrap().is_none());
        assert!(oldest(&store).await.unwrap().is_none());
        assert!(normalized_values_all(&store).await.unwrap().is_empty());
        assert!(oldest_or_newest(&store, Asset::Ripple, SortDirection::Asc)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_extremes_bound_every_price_of_the_asset() {
        let prices = [3.5, 1.25, 9.0, 4.0, 9.0, 1.25];
        let points: Vec<_> = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| point(Asset::Dogecoin, i as i64 + 1, price))
            .collect();
        let store = InMemoryPricePointStore::with_points(points.clone());

        let min = min_by_name(&store, Asset::Dogecoin).await.unwrap().unwrap();
        let max = max_by_name(&store, Asset::Dogecoin).await.unwrap().unwrap();
        assert!(points.iter().all(|p| min.price <= p.price && max.price >= p.price));
        assert_eq!(min.timing, 2);
        assert_eq!(max.timing, 3);
    }

    #[tokio::test]
    async fn test_oldest_or_newest_returns_one_point() {
        let store = InMemoryPricePointStore::with_points(scenario());

        let asc = oldest_or_newest(&store, Asset::Bitcoin, SortDirection::Asc).await.unwrap();
        let desc = oldest_or_newest(&store, Asset::Bitcoin, SortDirection::Desc).await.unwrap();
        assert_eq!(asc.iter().map(|p| p.timing).collect::<Vec<_>>(), vec![100]);
        assert_eq!(desc.iter().map(|p| p.timing).collect::<Vec<_>>(), vec![200]);
    }

    #[tokio::test]
    async fn test_sorted_by_timing_returns_full_series() {
        let store = InMemoryPricePointStore::with_points(vec![
            point(Asset::Bitcoin, 300, 1.0),
            point(Asset::Bitcoin, 100, 2.0),
            point(Asset::Ethereum, 50, 3.0),
            point(Asset::Bitcoin, 200, 4.0),
        ]);

        let asc = sorted_by_timing(&store, Asset::Bitcoin, SortDirection::Asc).await.unwrap();
        let desc = sorted_by_timing(&store, Asset::Bitcoin, SortDirection::Desc).await.unwrap();
        assert_eq!(asc.iter().map(|p| p.timing).collect::<Vec<_>>(), vec![100, 200, 300]);
        assert_eq!(desc.iter().map(|p| p.timing).collect::<Vec<_>>(), vec![300, 200, 100]);
    }

    #[test]
    fn test_normalization_skips_zero_minimum() {
        let points = vec![
            point(Asset::Bitcoin, 1, 0.0),
            point(Asset::Bitcoin, 2, 10.0),
            point(Asset::Litecoin, 1, 50.0),
            point(Asset::Litecoin, 2, 100.0),
        ];
        let values = normalized_values(&points);
        assert!(!values.contains_key("Bitcoin"));
        assert_eq!(values["Litecoin"], 1.0);
        assert!(values.values().all(|&ratio| ratio >= 0.0));
    }

    #[test]
    fn test_highest_normalization_picks_largest_ratio() {
        let mut values = NormalizedValues::new();
        values.insert("Bitcoin".into(), 0.25);
        values.insert("Dogecoin".into(), 1.5);
        values.insert("Ethereum".into(), 1.5);
        assert_eq!(highest_normalization(&values), Some(("Dogecoin", 1.5)));
        assert_eq!(highest_normalization(&NormalizedValues::new()), None);
    }

    #[tokio::test]
    async fn test_month_queries_stay_inside_window() {
        let window = time_window::month_window(Month::March).unwrap();
        let before = window.start_millis - 1;
        let store = InMemoryPricePointStore::with_points(vec![
            point(Asset::Ethereum, before, 1.0),
            point(Asset::Ethereum, window.start_millis + 10, 2_500.0),
            point(Asset::Ethereum, window.start_millis + 20, 2_000.0),
            point(Asset::Ethereum, window.end_millis, 2_200.0),
            point(Asset::Ethereum, window.end_millis + 1, 9_999.0),
            point(Asset::Bitcoin, window.start_millis + 5, 10.0),
        ]);

        let oldest = oldest_by_name_and_month(&store, Asset::Ethereum, Month::March).await.unwrap();
        let newest = newest_by_name_and_month(&store, Asset::Ethereum, Month::March).await.unwrap();
        assert_eq!(oldest.unwrap().timing, window.start_millis + 10);
        assert_eq!(newest.unwrap().timing, window.end_millis);

        let max = extreme_by_name_and_month(&store, Asset::Ethereum, Month::March, PriceExtreme::Max)
            .await
            .unwrap();
        let min = extreme_by_name_and_month(&store, Asset::Ethereum, Month::March, PriceExtreme::Min)
            .await
            .unwrap();
        assert_eq!(max.unwrap().price, 2_500.0);
        assert_eq!(min.unwrap().price, 2_000.0);

        let empty = oldest_by_name_and_month(&store, Asset::Ripple, Month::March).await.unwrap();
        assert!(empty.is_none());
    }

    #[tokio::test]
    async fn test_range_extremes_filter_by_name() {
        let window = TimeWindow { start_millis: 1_000, end_millis: 2_000 };
        let store = InMemoryPricePointStore::with_points(vec![
            point(Asset::Bitcoin, 999, 1.0),
            point(Asset::Bitcoin, 1_000, 30.0),
            point(Asset::Bitcoin, 1_500, 10.0),
            point(Asset::Bitcoin, 2_000, 20.0),
            point(Asset::Ethereum, 1_200, 5.0),
        ]);

        let min = price_extreme_in_range(&store, Asset::Bitcoin, window, PriceExtreme::Min).await.unwrap();
        let max = price_extreme_in_range(&store, Asset::Bitcoin, window, PriceExtreme::Max).await.unwrap();
        assert_eq!(min.unwrap().price, 10.0);
        assert_eq!(max.unwrap().price, 30.0);

        let none = price_extreme_in_range(&store, Asset::Litecoin, window, PriceExtreme::Max).await.unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_highest_normalization_returns_point_of_best_asset() {
        let window = TimeWindow { start_millis: 1_000, end_millis: 2_000 };
        let store = InMemoryPricePointStore::with_points(vec![
            point(Asset::Bitcoin, 1_100, 100.0),
            point(Asset::Bitcoin, 1_200, 110.0),
            point(Asset::Dogecoin, 1_300, 0.10),
            point(Asset::Dogecoin, 1_400, 0.30),
            point(Asset::Dogecoin, 2_500, 100.0),
        ]);

        let best = highest_normalization_in_window(&store, window).await.unwrap().unwrap();
        assert_eq!(best.name, "Dogecoin");
        assert_eq!(best.timing, 1_300);

        let empty = TimeWindow { start_millis: 5_000, end_millis: 6_000 };
        assert!(highest_normalization_in_window(&store, empty).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_inputs_fail_before_querying() {
        let store = InMemoryPricePointStore::new();
        assert!(matches!(
            highest_normalization_for_date(&store, "not-a-date").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            min_by_name_and_days(&store, Asset::Bitcoin, 0).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            highest_normalization_by_name_and_days(&store, Asset::Bitcoin, -1).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_repeated_reads_are_identical() {
        let store = InMemoryPricePointStore::with_points(scenario());
        let first = grouped_extremes(&store, PriceExtreme::Max).await.unwrap();
        let second = grouped_extremes(&store, PriceExtreme::Max).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            normalized_values_all(&store).await.unwrap(),
            normalized_values_all(&store).await.unwrap()
        );
    }
}
