use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// The assets the service tracks. Each one is reachable by its display name
/// or its ticker, case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    Bitcoin,
    Ethereum,
    Ripple,
    Dogecoin,
    Litecoin,
}

impl Asset {
    pub const ALL: [Asset; 5] = [
        Asset::Bitcoin,
        Asset::Ethereum,
        Asset::Ripple,
        Asset::Dogecoin,
        Asset::Litecoin,
    ];

    /// Canonical name stored on every price point.
    pub fn display_name(self) -> &'static str {
        match self {
            Asset::Bitcoin => "Bitcoin",
            Asset::Ethereum => "Ethereum",
            Asset::Ripple => "Ripple",
            Asset::Dogecoin => "Dogecoin",
            Asset::Litecoin => "Litecoin",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Asset::Bitcoin => "BTC",
            Asset::Ethereum => "ETH",
            Asset::Ripple => "XRP",
            Asset::Dogecoin => "DOGE",
            Asset::Litecoin => "LTC",
        }
    }

    /// Display names are matched before tickers.
    pub fn resolve(input: &str) -> Result<Asset, AppError> {
        let needle = input.trim();
        Self::ALL
            .iter()
            .find(|asset| asset.display_name().eq_ignore_ascii_case(needle))
            .or_else(|| {
                Self::ALL
                    .iter()
                    .find(|asset| asset.symbol().eq_ignore_ascii_case(needle))
            })
            .copied()
            .ok_or_else(|| AppError::UnknownAsset(input.to_string()))
    }
}

impl FromStr for Asset {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Asset::resolve(s)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_and_name_resolve_to_same_asset() {
        assert_eq!(Asset::resolve("BTC").unwrap(), Asset::Bitcoin);
        assert_eq!(Asset::resolve("Bitcoin").unwrap(), Asset::Bitcoin);
        assert_eq!(Asset::resolve("bItCoIn").unwrap().display_name(), "Bitcoin");
        assert_eq!(Asset::resolve("doge").unwrap(), Asset::Dogecoin);
    }

    #[test]
    fn test_every_asset_round_trips_through_both_keys() {
        for asset in Asset::ALL {
            assert_eq!(Asset::resolve(asset.display_name()).unwrap(), asset);
            assert_eq!(Asset::resolve(asset.symbol()).unwrap(), asset);
        }
    }

    #[test]
    fn test_unknown_asset_is_typed_error() {
        match Asset::resolve("Fakecoin") {
            Err(AppError::UnknownAsset(name)) => assert_eq!(name, "Fakecoin"),
            other => panic!("expected UnknownAsset, got {:?}", other),
        }
    }
}
