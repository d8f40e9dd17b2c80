//! Snapshot Types
//!
//! View structs returned by the snapshot aggregator. These are read models
//! only; nothing here is persisted.

use serde::{Deserialize, Serialize};

use super::asset::AssetClass;
use super::futures::{FuturesAccount, FuturesPosition};
use super::options::OptionPosition;
use super::portfolio::SpotTransaction;

/// A spot holding enriched with live pricing and recent activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotHoldingView {
    pub ticker: String,
    pub asset_class: AssetClass,
    pub quantity: f64,
    pub average_price: f64,
    pub current_price: f64,
    pub market_value: f64,
    pub cost_basis: f64,
    pub pnl: f64,
    pub pnl_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thesis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Last buy/sell entries for this ticker, newest first, capped at 10.
    pub recent_transactions: Vec<SpotTransaction>,
}

/// Flattened cross-product position row used for ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedPosition {
    pub symbol: String,
    pub asset_class: AssetClass,
    pub quantity: f64,
    pub value: f64,
    pub pnl: f64,
}

/// Change versus the most recent prior daily snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayChange {
    pub previous_date: String,
    pub previous_value: f64,
    pub change: f64,
    pub change_percent: f64,
}

/// Unified read across the ledger and both engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub cash: f64,
    pub spot_equity: f64,
    pub futures_margin_used: f64,
    pub futures_unrealized_pnl: f64,
    pub options_value: f64,
    pub total_equity: f64,
    pub spot_holdings: Vec<SpotHoldingView>,
    pub futures_positions: Vec<FuturesPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub futures_account: Option<FuturesAccount>,
    pub option_positions: Vec<OptionPosition>,
    /// All positions sorted by absolute PnL, largest first.
    pub all_positions: Vec<UnifiedPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_change: Option<DayChange>,
    pub generated_at: String,
}
