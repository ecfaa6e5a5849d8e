mod analytics;
mod asset;
mod price_point;

pub use analytics::{NormalizedValues, PriceExtreme, Recency, SortDirection};
pub use asset::Asset;
pub use price_point::{CreatePricePoint, PricePoint};
