//! Domain event payloads emitted through the broadcaster.

use serde::{Deserialize, Serialize};

use super::asset::PositionSide;

/// Event name for forced futures liquidations.
pub const EVENT_FUTURES_LIQUIDATION: &str = "futures.liquidation";

/// Event name for options expiry settlement.
pub const EVENT_OPTIONS_EXPIRED: &str = "options.expired";

/// Payload of `futures.liquidation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidationEvent {
    pub ticker: String,
    pub side: PositionSide,
    pub quantity: f64,
    pub entry_price: f64,
    pub mark_price: f64,
    pub pnl: f64,
    pub liquidated_at: String,
}

/// Payload of `options.expired`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionExpiryEvent {
    pub underlying: String,
    pub symbol: String,
    pub strike_price: f64,
    pub expiry_date: String,
    pub contracts: u32,
    pub settlement: f64,
    pub pnl: f64,
    pub itm: bool,
    pub settled_at: String,
}
