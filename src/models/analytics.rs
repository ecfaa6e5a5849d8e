use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Asset name to `(max - min) / min` over that asset's prices.
pub type NormalizedValues = BTreeMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceExtreme {
    Max,
    Min,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recency {
    Oldest,
    Newest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything other than "desc" (any case) sorts ascending.
    pub fn lenient(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    pub fn recency(self) -> Recency {
        match self {
            SortDirection::Asc => Recency::Oldest,
            SortDirection::Desc => Recency::Newest,
        }
    }
}
