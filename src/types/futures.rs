//! Futures Types
//!
//! Isolated-margin perpetual positions and the futures transaction log.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::asset::{AssetClass, MarginMode, PositionSide};

/// Default leverage applied when neither the call nor the per-ticker
/// setting specifies one.
pub const DEFAULT_LEVERAGE: u32 = 20;

/// Leverage bounds accepted by the engine.
pub const MIN_LEVERAGE: u32 = 1;
pub const MAX_LEVERAGE: u32 = 150;

/// Futures transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuturesTxType {
    OpenLong,
    OpenShort,
    CloseLong,
    CloseShort,
    Liquidation,
}

impl std::fmt::Display for FuturesTxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FuturesTxType::OpenLong => write!(f, "open_long"),
            FuturesTxType::OpenShort => write!(f, "open_short"),
            FuturesTxType::CloseLong => write!(f, "close_long"),
            FuturesTxType::CloseShort => write!(f, "close_short"),
            FuturesTxType::Liquidation => write!(f, "liquidation"),
        }
    }
}

/// An open isolated-margin perpetual position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesPosition {
    pub id: String,
    pub ticker: String,
    pub asset_class: AssetClass,
    pub side: PositionSide,
    pub quantity: f64,
    pub entry_price: f64,
    pub mark_price: f64,
    pub leverage: u32,
    pub margin_mode: MarginMode,
    pub initial_margin: f64,
    pub maintenance_margin: f64,
    pub margin_balance: f64,
    pub liquidation_price: f64,
    pub maintenance_margin_rate: f64,
    pub unrealized_pnl: f64,
    pub roe: f64,
    pub realized_pnl: f64,
    pub opened_at: String,
    pub updated_at: String,
}

/// One entry of the futures transaction log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesTransaction {
    #[serde(rename = "type")]
    pub tx_type: FuturesTxType,
    pub ticker: String,
    pub quantity: f64,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leverage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl: Option<f64>,
    pub date: String,
}

/// The persisted futures aggregate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesData {
    #[serde(default)]
    pub positions: Vec<FuturesPosition>,
    #[serde(default)]
    pub leverage_settings: HashMap<String, u32>,
    #[serde(default)]
    pub transactions: Vec<FuturesTransaction>,
}

/// Account-level futures summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesAccount {
    /// Free cash in the shared ledger.
    pub available_balance: f64,
    /// Sum of initial margin across open positions.
    pub total_margin_used: f64,
    /// Sum of unrealized PnL across open positions.
    pub total_unrealized_pnl: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_futures_tx_type_serialization() {
        assert_eq!(
            serde_json::to_string(&FuturesTxType::OpenLong).unwrap(),
            "\"open_long\""
        );
        assert_eq!(
            serde_json::to_string(&FuturesTxType::Liquidation).unwrap(),
            "\"liquidation\""
        );
    }

    #[test]
    fn test_futures_data_default_is_empty() {
        let data = FuturesData::default();
        assert!(data.positions.is_empty());
        assert!(data.leverage_settings.is_empty());
        assert!(data.transactions.is_empty());
    }

    #[test]
    fn test_futures_data_roundtrip() {
        let mut data = FuturesData::default();
        data.leverage_settings.insert("BTC".to_string(), 50);

        let json = serde_json::to_string(&data).unwrap();
        let parsed: FuturesData = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.leverage_settings.get("BTC"), Some(&50));
    }
}
