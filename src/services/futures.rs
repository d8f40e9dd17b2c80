//! Futures Engine
//!
//! Isolated-margin crypto perpetuals: open long/short, full and partial
//! close, per-ticker leverage configuration, live mark refresh, and forced
//! liquidation. Margin math lives in [`crate::services::margin`]; cash moves
//! only through the portfolio ledger.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::services::margin;
use crate::services::portfolio::PortfolioService;
use crate::services::spot::crypto_symbol;
use crate::services::store::JsonStore;
use crate::sources::QuoteProvider;
use crate::types::{
    normalize_ticker, AssetClass, FuturesAccount, FuturesData, FuturesPosition,
    FuturesTransaction, FuturesTxType, LiquidationEvent, MarginMode, PositionSide,
    DEFAULT_LEVERAGE, MAX_LEVERAGE, MIN_LEVERAGE,
};

/// The perpetual futures engine.
pub struct FuturesEngine {
    state: Mutex<FuturesData>,
    store: JsonStore<FuturesData>,
    portfolio: Arc<PortfolioService>,
    source: Arc<dyn QuoteProvider>,
}

impl FuturesEngine {
    /// Load the futures aggregate from its store.
    pub fn new(
        store: JsonStore<FuturesData>,
        portfolio: Arc<PortfolioService>,
        source: Arc<dyn QuoteProvider>,
    ) -> Result<Self> {
        let state = store.load()?;
        Ok(Self {
            state: Mutex::new(state),
            store,
            portfolio,
            source,
        })
    }

    /// Open a long position at the current mark.
    pub async fn open_long(&self, ticker: &str, quantity: f64, leverage: Option<u32>) -> Result<FuturesPosition> {
        self.open(PositionSide::Long, ticker, quantity, leverage).await
    }

    /// Open a short position at the current mark.
    pub async fn open_short(&self, ticker: &str, quantity: f64, leverage: Option<u32>) -> Result<FuturesPosition> {
        self.open(PositionSide::Short, ticker, quantity, leverage).await
    }

    async fn open(
        &self,
        side: PositionSide,
        ticker: &str,
        quantity: f64,
        leverage: Option<u32>,
    ) -> Result<FuturesPosition> {
        let ticker = normalize_ticker(ticker);
        if quantity <= 0.0 {
            return Err(EngineError::InvalidParam(
                "Quantity must be positive".to_string(),
            ));
        }

        let mut state = self.state.lock().await;

        let leverage = leverage
            .or_else(|| state.leverage_settings.get(&ticker).copied())
            .unwrap_or(DEFAULT_LEVERAGE);
        if !(MIN_LEVERAGE..=MAX_LEVERAGE).contains(&leverage) {
            return Err(EngineError::InvalidParam(format!(
                "Leverage must be between {} and {}",
                MIN_LEVERAGE, MAX_LEVERAGE
            )));
        }

        let quote = self.source.fetch_quote(&crypto_symbol(&ticker)).await?;
        if quote.price <= 0.0 {
            return Err(EngineError::InvalidParam(format!(
                "No valid mark price for {}",
                ticker
            )));
        }
        let mark = quote.price;

        let initial_margin = margin::initial_margin(quantity, mark, leverage);
        let available = self.portfolio.cash().await;
        if available < initial_margin {
            return Err(EngineError::InsufficientFunds {
                needed: initial_margin,
                available,
            });
        }

        let notional = quantity * mark;
        let mm_rate = margin::maintenance_margin_rate(notional);
        let liquidation_price = margin::liquidation_price(side, mark, leverage, mm_rate);
        let maintenance_margin = margin::maintenance_margin(quantity, mark, mm_rate);

        self.portfolio.adjust_cash(-initial_margin).await?;

        let now = chrono::Utc::now().to_rfc3339();
        let position = FuturesPosition {
            id: uuid::Uuid::new_v4().to_string(),
            ticker: ticker.clone(),
            asset_class: AssetClass::CryptoPerp,
            side,
            quantity,
            entry_price: mark,
            mark_price: mark,
            leverage,
            margin_mode: MarginMode::Isolated,
            initial_margin,
            maintenance_margin,
            margin_balance: initial_margin,
            liquidation_price,
            maintenance_margin_rate: mm_rate,
            unrealized_pnl: 0.0,
            roe: 0.0,
            realized_pnl: 0.0,
            opened_at: now.clone(),
            updated_at: now.clone(),
        };

        state.positions.push(position.clone());
        state.transactions.push(FuturesTransaction {
            tx_type: match side {
                PositionSide::Long => FuturesTxType::OpenLong,
                PositionSide::Short => FuturesTxType::OpenShort,
            },
            ticker: ticker.clone(),
            quantity,
            price: mark,
            leverage: Some(leverage),
            pnl: None,
            date: now,
        });

        self.store.save(&state).await?;
        info!(
            "Opened {} {} {} @ {} ({}x, margin {:.2})",
            side, quantity, ticker, mark, leverage, initial_margin
        );
        Ok(position)
    }

    /// Close a position, fully or partially, at the current mark. Returns
    /// the realized PnL on the closed quantity.
    pub async fn close_position(&self, id: &str, quantity: Option<f64>) -> Result<f64> {
        let mut state = self.state.lock().await;

        let idx = state
            .positions
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("No open position {}", id)))?;

        let (ticker, side, held, entry, leverage, position_margin) = {
            let p = &state.positions[idx];
            (
                p.ticker.clone(),
                p.side,
                p.quantity,
                p.entry_price,
                p.leverage,
                p.initial_margin,
            )
        };

        let close_qty = quantity.unwrap_or(held);
        if close_qty <= 0.0 || close_qty > held + 1e-9 {
            return Err(EngineError::InvalidParam(format!(
                "Close quantity must be in (0, {}]",
                held
            )));
        }

        let quote = self.source.fetch_quote(&crypto_symbol(&ticker)).await?;
        if quote.price <= 0.0 {
            return Err(EngineError::InvalidParam(format!(
                "No valid mark price for {}",
                ticker
            )));
        }
        let mark = quote.price;

        let pnl = margin::unrealized_pnl(side, close_qty, entry, mark);
        let margin_released = (close_qty / held) * position_margin;

        // Isolated margin: the credit never goes below zero even if the
        // loss exceeds the released margin.
        self.portfolio
            .adjust_cash((margin_released + pnl).max(0.0))
            .await?;

        let remaining = held - close_qty;
        let now = chrono::Utc::now().to_rfc3339();
        if remaining <= 1e-9 {
            state.positions.remove(idx);
        } else {
            let p = &mut state.positions[idx];
            p.quantity = remaining;
            p.initial_margin -= margin_released;
            p.margin_balance = p.initial_margin;
            p.realized_pnl += pnl;
            p.updated_at = now.clone();
        }

        state.transactions.push(FuturesTransaction {
            tx_type: match side {
                PositionSide::Long => FuturesTxType::CloseLong,
                PositionSide::Short => FuturesTxType::CloseShort,
            },
            ticker: ticker.clone(),
            quantity: close_qty,
            price: mark,
            leverage: Some(leverage),
            pnl: Some(pnl),
            date: now,
        });

        self.store.save(&state).await?;
        info!("Closed {} {} @ {} (pnl {:.2})", close_qty, ticker, mark, pnl);
        Ok(pnl)
    }

    /// Set the default leverage for a ticker. Rejected while any position
    /// is open on that ticker.
    pub async fn set_leverage(&self, ticker: &str, leverage: u32) -> Result<()> {
        let ticker = normalize_ticker(ticker);
        if !(MIN_LEVERAGE..=MAX_LEVERAGE).contains(&leverage) {
            return Err(EngineError::InvalidParam(format!(
                "Leverage must be between {} and {}",
                MIN_LEVERAGE, MAX_LEVERAGE
            )));
        }

        let mut state = self.state.lock().await;
        if state.positions.iter().any(|p| p.ticker == ticker) {
            return Err(EngineError::Invariant(format!(
                "Cannot change leverage while a {} position is open",
                ticker
            )));
        }

        state.leverage_settings.insert(ticker, leverage);
        self.store.save(&state).await?;
        Ok(())
    }

    /// Refresh marks for all open positions and return a copy. Individual
    /// quote failures keep the last known mark.
    pub async fn get_positions(&self) -> Result<Vec<FuturesPosition>> {
        let mut state = self.state.lock().await;

        let tickers: BTreeSet<String> =
            state.positions.iter().map(|p| p.ticker.clone()).collect();

        for ticker in tickers {
            match self.source.fetch_quote(&crypto_symbol(&ticker)).await {
                Ok(quote) if quote.price > 0.0 => {
                    for p in state.positions.iter_mut().filter(|p| p.ticker == ticker) {
                        p.mark_price = quote.price;
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("Mark refresh failed for {}: {}", ticker, e),
            }
        }

        let now = chrono::Utc::now().to_rfc3339();
        for p in state.positions.iter_mut() {
            let notional = p.quantity * p.mark_price;
            p.maintenance_margin_rate = margin::maintenance_margin_rate(notional);
            p.maintenance_margin =
                margin::maintenance_margin(p.quantity, p.mark_price, p.maintenance_margin_rate);
            p.unrealized_pnl =
                margin::unrealized_pnl(p.side, p.quantity, p.entry_price, p.mark_price);
            p.roe = margin::roe(p.unrealized_pnl, p.initial_margin);
            p.updated_at = now.clone();
        }

        self.store.save(&state).await?;
        Ok(state.positions.clone())
    }

    /// A copy of the positions without refreshing marks. Used by the
    /// liquidation monitor, which fetches its own marks.
    pub async fn positions_snapshot(&self) -> Vec<FuturesPosition> {
        self.state.lock().await.positions.clone()
    }

    /// Account-level margin summary.
    pub async fn get_account(&self) -> FuturesAccount {
        let state = self.state.lock().await;
        FuturesAccount {
            available_balance: self.portfolio.cash().await,
            total_margin_used: state.positions.iter().map(|p| p.initial_margin).sum(),
            total_unrealized_pnl: state.positions.iter().map(|p| p.unrealized_pnl).sum(),
        }
    }

    /// Force-close a position at the given mark. Returns `None` when the
    /// position no longer exists.
    pub async fn liquidate_position(
        &self,
        id: &str,
        mark_price: f64,
    ) -> Result<Option<LiquidationEvent>> {
        let mut state = self.state.lock().await;

        let Some(idx) = state.positions.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        let position = state.positions.remove(idx);

        // Losses are bounded by the position's margin balance.
        let raw_pnl = margin::unrealized_pnl(
            position.side,
            position.quantity,
            position.entry_price,
            mark_price,
        );
        let pnl = raw_pnl.max(-position.margin_balance);

        self.portfolio
            .adjust_cash((position.margin_balance + pnl).max(0.0))
            .await?;

        let now = chrono::Utc::now().to_rfc3339();
        state.transactions.push(FuturesTransaction {
            tx_type: FuturesTxType::Liquidation,
            ticker: position.ticker.clone(),
            quantity: position.quantity,
            price: mark_price,
            leverage: Some(position.leverage),
            pnl: Some(pnl),
            date: now.clone(),
        });

        self.store.save(&state).await?;
        warn!(
            "Liquidated {} {} {} @ {} (pnl {:.2})",
            position.side, position.quantity, position.ticker, mark_price, pnl
        );

        Ok(Some(LiquidationEvent {
            ticker: position.ticker,
            side: position.side,
            quantity: position.quantity,
            entry_price: position.entry_price,
            mark_price,
            pnl,
            liquidated_at: now,
        }))
    }

    /// Most recent futures transactions, newest first.
    pub async fn get_transactions(&self, limit: usize) -> Vec<FuturesTransaction> {
        let state = self.state.lock().await;
        state.transactions.iter().rev().take(limit).cloned().collect()
    }

    /// Wipe the aggregate back to defaults. Cash already released to the
    /// ledger is untouched.
    pub async fn reset(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = FuturesData::default();
        self.store.save(&state).await?;
        Ok(())
    }
}
