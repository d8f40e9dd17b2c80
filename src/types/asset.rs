//! Asset classification and side enums shared across the engines.

use serde::{Deserialize, Serialize};

/// Asset class of a holding or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// Spot US equities
    UsStockSpot,
    /// Spot cryptocurrency
    CryptoSpot,
    /// Crypto perpetual futures
    CryptoPerp,
    /// US equity options
    UsStockOption,
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetClass::UsStockSpot => write!(f, "us_stock_spot"),
            AssetClass::CryptoSpot => write!(f, "crypto_spot"),
            AssetClass::CryptoPerp => write!(f, "crypto_perp"),
            AssetClass::UsStockOption => write!(f, "us_stock_option"),
        }
    }
}

/// Routing hint for spot orders and quote lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    #[default]
    Crypto,
    Stock,
}

impl AssetType {
    /// Spot asset class this routing hint maps to.
    pub fn spot_class(&self) -> AssetClass {
        match self {
            AssetType::Crypto => AssetClass::CryptoSpot,
            AssetType::Stock => AssetClass::UsStockSpot,
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetType::Crypto => write!(f, "crypto"),
            AssetType::Stock => write!(f, "stock"),
        }
    }
}

/// Position side (long or short).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSide {
    Long,
    Short,
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
        }
    }
}

/// Margin mode for leveraged positions. Only isolated margin is supported:
/// the maximum loss on a position is bounded by its own initial margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginMode {
    #[default]
    Isolated,
}

impl std::fmt::Display for MarginMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarginMode::Isolated => write!(f, "isolated"),
        }
    }
}

/// Option contract type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    Call,
    Put,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

/// Normalize a ticker at ingress.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_class_serialization() {
        assert_eq!(
            serde_json::to_string(&AssetClass::UsStockSpot).unwrap(),
            "\"us_stock_spot\""
        );
        assert_eq!(
            serde_json::to_string(&AssetClass::CryptoSpot).unwrap(),
            "\"crypto_spot\""
        );
        assert_eq!(
            serde_json::to_string(&AssetClass::CryptoPerp).unwrap(),
            "\"crypto_perp\""
        );
        assert_eq!(
            serde_json::to_string(&AssetClass::UsStockOption).unwrap(),
            "\"us_stock_option\""
        );
    }

    #[test]
    fn test_asset_type_default_is_crypto() {
        assert_eq!(AssetType::default(), AssetType::Crypto);
    }

    #[test]
    fn test_asset_type_spot_class() {
        assert_eq!(AssetType::Crypto.spot_class(), AssetClass::CryptoSpot);
        assert_eq!(AssetType::Stock.spot_class(), AssetClass::UsStockSpot);
    }

    #[test]
    fn test_normalize_ticker() {
        assert_eq!(normalize_ticker("btc"), "BTC");
        assert_eq!(normalize_ticker(" aapl "), "AAPL");
        assert_eq!(normalize_ticker("ETH"), "ETH");
    }

    #[test]
    fn test_margin_mode_serialization() {
        assert_eq!(
            serde_json::to_string(&MarginMode::Isolated).unwrap(),
            "\"isolated\""
        );
    }
}
