//! Portfolio Ledger
//!
//! Owns the shared cash pool, spot holdings, the append-only spot
//! transaction history, per-holding metadata, and the rolling daily value
//! snapshots. Every mutation persists before returning. The engines touch
//! cash exclusively through [`PortfolioService::adjust_cash`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{EngineError, Result};
use crate::services::store::JsonStore;
use crate::types::{
    normalize_ticker, AssetType, DailySnapshot, Holding, HoldingMeta, Portfolio, SpotTransaction,
    SpotTxType, DAILY_SNAPSHOT_CAP, DEFAULT_STARTING_CASH,
};

/// Valuation of the ledger at a set of prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValue {
    pub total_value: f64,
    pub spot_equity: f64,
    pub cash: f64,
}

/// The portfolio ledger service.
pub struct PortfolioService {
    state: Mutex<Portfolio>,
    store: JsonStore<Portfolio>,
}

impl PortfolioService {
    /// Load the ledger from its store, initializing defaults on first run.
    pub fn new(store: JsonStore<Portfolio>) -> Result<Self> {
        let state = store.load()?;
        Ok(Self {
            state: Mutex::new(state),
            store,
        })
    }

    /// Current free cash.
    pub async fn cash(&self) -> f64 {
        self.state.lock().await.cash
    }

    /// A copy of the full ledger state.
    pub async fn snapshot(&self) -> Portfolio {
        self.state.lock().await.clone()
    }

    /// Recorded routing hint for a ticker, if any.
    pub async fn ticker_type(&self, ticker: &str) -> Option<AssetType> {
        self.state.lock().await.ticker_types.get(ticker).copied()
    }

    /// Buy spot units at the given price, merging into any existing holding
    /// with a weighted average entry.
    pub async fn buy_spot(
        &self,
        ticker: &str,
        quantity: f64,
        price: f64,
        reasoning: Option<String>,
        asset_type: Option<AssetType>,
    ) -> Result<SpotTransaction> {
        if quantity <= 0.0 || price <= 0.0 {
            return Err(EngineError::InvalidParam(
                "Quantity and price must be positive".to_string(),
            ));
        }

        let ticker = normalize_ticker(ticker);
        let cost = quantity * price;

        let mut state = self.state.lock().await;
        if state.cash < cost {
            return Err(EngineError::InsufficientFunds {
                needed: cost,
                available: state.cash,
            });
        }
        state.cash -= cost;

        match state.holdings.get_mut(&ticker) {
            Some(holding) => {
                let new_quantity = holding.quantity + quantity;
                holding.average_price =
                    (holding.quantity * holding.average_price + quantity * price) / new_quantity;
                holding.quantity = new_quantity;
                if let Some(asset_type) = asset_type {
                    holding.asset_class = asset_type.spot_class();
                }
            }
            None => {
                let resolved = asset_type
                    .or_else(|| state.ticker_types.get(&ticker).copied())
                    .unwrap_or_default();
                state.holdings.insert(
                    ticker.clone(),
                    Holding {
                        quantity,
                        average_price: price,
                        asset_class: resolved.spot_class(),
                    },
                );
            }
        }

        if let Some(asset_type) = asset_type {
            state.ticker_types.insert(ticker.clone(), asset_type);
        }

        let tx = SpotTransaction {
            tx_type: SpotTxType::Buy,
            ticker: ticker.clone(),
            quantity,
            price,
            date: chrono::Utc::now().to_rfc3339(),
            reasoning,
        };
        state.transaction_history.push(tx.clone());

        self.store.save(&state).await?;
        info!("Bought {} {} @ {}", quantity, ticker, price);
        Ok(tx)
    }

    /// Sell spot units at the given price. The holding keeps its original
    /// average price on a partial sell and is removed when fully sold.
    pub async fn sell_spot(
        &self,
        ticker: &str,
        quantity: f64,
        price: f64,
        reasoning: Option<String>,
    ) -> Result<SpotTransaction> {
        if quantity <= 0.0 || price <= 0.0 {
            return Err(EngineError::InvalidParam(
                "Quantity and price must be positive".to_string(),
            ));
        }

        let ticker = normalize_ticker(ticker);
        let mut state = self.state.lock().await;

        let held = state.holdings.get(&ticker).map(|h| h.quantity).unwrap_or(0.0);
        if held < quantity {
            return Err(EngineError::InsufficientHoldings {
                ticker,
                requested: quantity,
                held,
            });
        }

        state.cash += quantity * price;

        let remaining = held - quantity;
        if remaining <= 1e-9 {
            state.holdings.remove(&ticker);
        } else if let Some(holding) = state.holdings.get_mut(&ticker) {
            holding.quantity = remaining;
        }

        let tx = SpotTransaction {
            tx_type: SpotTxType::Sell,
            ticker: ticker.clone(),
            quantity,
            price,
            date: chrono::Utc::now().to_rfc3339(),
            reasoning,
        };
        state.transaction_history.push(tx.clone());

        self.store.save(&state).await?;
        info!("Sold {} {} @ {}", quantity, ticker, price);
        Ok(tx)
    }

    /// Adjust cash by a signed delta, clamped at zero. The sole channel by
    /// which the engines mutate cash.
    pub async fn adjust_cash(&self, delta: f64) -> Result<f64> {
        let mut state = self.state.lock().await;
        state.cash = (state.cash + delta).max(0.0);
        let cash = state.cash;
        self.store.save(&state).await?;
        Ok(cash)
    }

    /// Partial-update the metadata attached to a holding.
    pub async fn set_holding_meta(
        &self,
        ticker: &str,
        thesis: Option<String>,
        context: Option<String>,
    ) -> Result<()> {
        let ticker = normalize_ticker(ticker);
        let mut state = self.state.lock().await;

        let meta = state.holding_meta.entry(ticker).or_insert_with(HoldingMeta::default);
        if thesis.is_some() {
            meta.thesis = thesis;
        }
        if context.is_some() {
            meta.context = context;
        }

        self.store.save(&state).await?;
        Ok(())
    }

    /// Replace the ledger with a fresh account. Engine aggregates are not
    /// touched; reset them separately for a coordinated wipe.
    pub async fn reset(&self, cash: Option<f64>) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = Portfolio::with_cash(cash.unwrap_or(DEFAULT_STARTING_CASH));
        self.store.save(&state).await?;
        info!("Portfolio reset to ${:.2}", state.cash);
        Ok(())
    }

    /// Create or update today's daily value snapshot, keeping the most
    /// recent entries only.
    pub async fn record_daily_snapshot(&self, total_value: f64) -> Result<()> {
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let mut state = self.state.lock().await;

        match state.daily_snapshots.iter_mut().find(|s| s.date == today) {
            Some(entry) => entry.total_value = total_value,
            None => state.daily_snapshots.push(DailySnapshot {
                date: today,
                total_value,
            }),
        }

        let len = state.daily_snapshots.len();
        if len > DAILY_SNAPSHOT_CAP {
            state.daily_snapshots.drain(..len - DAILY_SNAPSHOT_CAP);
        }

        self.store.save(&state).await?;
        Ok(())
    }

    /// Value the ledger at the given prices, falling back to average prices
    /// for tickers with no quote.
    pub async fn portfolio_value(&self, prices: &HashMap<String, f64>) -> PortfolioValue {
        let state = self.state.lock().await;
        let spot_equity = state.spot_equity(prices);
        PortfolioValue {
            total_value: state.cash + spot_equity,
            spot_equity,
            cash: state.cash,
        }
    }

    /// Most recent spot transactions, newest first.
    pub async fn transactions(&self, limit: usize) -> Vec<SpotTransaction> {
        let state = self.state.lock().await;
        state
            .transaction_history
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }
}
