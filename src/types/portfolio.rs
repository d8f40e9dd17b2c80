//! Portfolio Types
//!
//! The portfolio aggregate owns cash, spot holdings, the spot transaction
//! history, per-holding metadata, and the rolling daily value snapshots.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::asset::AssetClass;

/// Default starting cash for a fresh account.
pub const DEFAULT_STARTING_CASH: f64 = 100_000.0;

/// Number of daily snapshots retained.
pub const DAILY_SNAPSHOT_CAP: usize = 90;

/// Spot transaction direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotTxType {
    Buy,
    Sell,
}

impl std::fmt::Display for SpotTxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpotTxType::Buy => write!(f, "buy"),
            SpotTxType::Sell => write!(f, "sell"),
        }
    }
}

/// A spot holding keyed by ticker. Quantity and average price are strictly
/// positive; fully-sold holdings are removed from the map, never zeroed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub quantity: f64,
    pub average_price: f64,
    pub asset_class: AssetClass,
}

/// One entry of the append-only spot transaction history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotTransaction {
    #[serde(rename = "type")]
    pub tx_type: SpotTxType,
    pub ticker: String,
    pub quantity: f64,
    pub price: f64,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Free-form notes attached to a holding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thesis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// End-of-day account value sample, one per calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySnapshot {
    /// `YYYY-MM-DD`, unique within the history.
    pub date: String,
    pub total_value: f64,
}

/// The persisted portfolio aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    /// Free cash, never negative.
    pub cash: f64,
    #[serde(default)]
    pub holdings: HashMap<String, Holding>,
    #[serde(default)]
    pub transaction_history: Vec<SpotTransaction>,
    #[serde(default)]
    pub holding_meta: HashMap<String, HoldingMeta>,
    /// Legacy routing hints (`crypto` / `stock`) recorded at buy time.
    #[serde(default)]
    pub ticker_types: HashMap<String, super::asset::AssetType>,
    #[serde(default)]
    pub daily_snapshots: Vec<DailySnapshot>,
}

impl Portfolio {
    /// Fresh account with the given starting cash.
    pub fn with_cash(cash: f64) -> Self {
        Self {
            cash,
            holdings: HashMap::new(),
            transaction_history: Vec::new(),
            holding_meta: HashMap::new(),
            ticker_types: HashMap::new(),
            daily_snapshots: Vec::new(),
        }
    }

    /// Spot equity valued at the given prices, falling back to each
    /// holding's average price where no quote is available.
    pub fn spot_equity(&self, prices: &HashMap<String, f64>) -> f64 {
        self.holdings
            .iter()
            .map(|(ticker, h)| {
                let price = prices
                    .get(ticker)
                    .copied()
                    .filter(|p| *p > 0.0)
                    .unwrap_or(h.average_price);
                h.quantity * price
            })
            .sum()
    }
}

impl Default for Portfolio {
    fn default() -> Self {
        Self::with_cash(DEFAULT_STARTING_CASH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_portfolio_cash() {
        let portfolio = Portfolio::default();
        assert_eq!(portfolio.cash, 100_000.0);
        assert!(portfolio.holdings.is_empty());
        assert!(portfolio.transaction_history.is_empty());
    }

    #[test]
    fn test_spot_equity_with_prices() {
        let mut portfolio = Portfolio::default();
        portfolio.holdings.insert(
            "AAPL".to_string(),
            Holding {
                quantity: 10.0,
                average_price: 150.0,
                asset_class: AssetClass::UsStockSpot,
            },
        );

        let mut prices = HashMap::new();
        prices.insert("AAPL".to_string(), 160.0);
        assert_eq!(portfolio.spot_equity(&prices), 1_600.0);
    }

    #[test]
    fn test_spot_equity_falls_back_to_average_price() {
        let mut portfolio = Portfolio::default();
        portfolio.holdings.insert(
            "ETH".to_string(),
            Holding {
                quantity: 2.0,
                average_price: 3_000.0,
                asset_class: AssetClass::CryptoSpot,
            },
        );

        assert_eq!(portfolio.spot_equity(&HashMap::new()), 6_000.0);
    }

    #[test]
    fn test_transaction_serialization_shape() {
        let tx = SpotTransaction {
            tx_type: SpotTxType::Buy,
            ticker: "BTC".to_string(),
            quantity: 0.5,
            price: 60_000.0,
            date: "2025-01-02T03:04:05Z".to_string(),
            reasoning: None,
        };

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "buy");
        assert_eq!(json["ticker"], "BTC");
        assert!(json.get("reasoning").is_none());
    }
}
