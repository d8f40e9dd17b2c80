//! Options Types
//!
//! Contracts, positions, and the options transaction log, plus the quote and
//! chain view structs returned to callers.

use serde::{Deserialize, Serialize};

use super::asset::{AssetClass, OptionType};

/// Shares per contract.
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

/// Options transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionTxType {
    BuyCall,
    BuyPut,
    SellCall,
    SellPut,
    ExpireItm,
    ExpireOtm,
}

impl OptionTxType {
    pub fn buy(option_type: OptionType) -> Self {
        match option_type {
            OptionType::Call => OptionTxType::BuyCall,
            OptionType::Put => OptionTxType::BuyPut,
        }
    }

    pub fn sell(option_type: OptionType) -> Self {
        match option_type {
            OptionType::Call => OptionTxType::SellCall,
            OptionType::Put => OptionTxType::SellPut,
        }
    }
}

impl std::fmt::Display for OptionTxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionTxType::BuyCall => write!(f, "buy_call"),
            OptionTxType::BuyPut => write!(f, "buy_put"),
            OptionTxType::SellCall => write!(f, "sell_call"),
            OptionTxType::SellPut => write!(f, "sell_put"),
            OptionTxType::ExpireItm => write!(f, "expire_itm"),
            OptionTxType::ExpireOtm => write!(f, "expire_otm"),
        }
    }
}

/// An option contract specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionContract {
    pub underlying: String,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub strike_price: f64,
    /// `YYYY-MM-DD`
    pub expiry_date: String,
    pub multiplier: f64,
    pub implied_vol: f64,
}

impl OptionContract {
    /// Display symbol, `UNDERLYING-YYMMDD-[C|P]-STRIKE`.
    pub fn symbol(&self) -> String {
        let compact_date = self.expiry_date.replace('-', "");
        let yymmdd = if compact_date.len() == 8 {
            &compact_date[2..]
        } else {
            compact_date.as_str()
        };
        let side = match self.option_type {
            OptionType::Call => 'C',
            OptionType::Put => 'P',
        };
        let strike = if self.strike_price.fract() == 0.0 {
            format!("{:.0}", self.strike_price)
        } else {
            format!("{}", self.strike_price)
        };
        format!("{}-{}-{}-{}", self.underlying, yymmdd, side, strike)
    }
}

/// An open long option position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionPosition {
    pub id: String,
    pub contract: OptionContract,
    pub asset_class: AssetClass,
    pub contracts: u32,
    /// Total premium debited when the position was opened (cost basis).
    pub premium_paid: f64,
    /// Per-share premium at open.
    pub premium_per_share: f64,
    /// Per-share premium at last refresh.
    pub current_premium: f64,
    /// Market value of the whole position at last refresh.
    pub current_value: f64,
    pub unrealized_pnl: f64,
    pub unrealized_pnl_percent: f64,
    pub days_to_expiry: f64,
    pub opened_at: String,
    /// Mirrors `contract.expiry_date` for flat consumers.
    pub expiry_date: String,
}

/// One entry of the options transaction log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionTransaction {
    #[serde(rename = "type")]
    pub tx_type: OptionTxType,
    pub underlying: String,
    pub strike_price: f64,
    pub expiry_date: String,
    pub contracts: u32,
    pub premium_per_share: f64,
    pub total_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl: Option<f64>,
    pub date: String,
}

/// The persisted options aggregate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsData {
    #[serde(default)]
    pub positions: Vec<OptionPosition>,
    #[serde(default)]
    pub transactions: Vec<OptionTransaction>,
}

/// Priced quote for a single contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionQuote {
    pub premium_per_share: f64,
    pub premium_per_contract: f64,
    pub intrinsic_value: f64,
    pub time_value: f64,
    pub days_to_expiry: f64,
    pub implied_vol: f64,
}

/// One strike row of a generated chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStrike {
    pub strike: f64,
    pub call_premium: f64,
    pub put_premium: f64,
    pub call_premium_per_contract: f64,
    pub put_premium_per_contract: f64,
}

/// All strikes for one expiry date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainExpiry {
    /// `YYYY-MM-DD`
    pub expiry_date: String,
    pub days_to_expiry: f64,
    pub strikes: Vec<ChainStrike>,
}
