//! Options Engine
//!
//! Long-only American-style stock options: buy, full and partial sell, live
//! premium refresh, and cash settlement at expiry. Premiums come from the
//! pricing module; cash moves only through the portfolio ledger.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::services::broadcaster::Broadcaster;
use crate::services::chain;
use crate::services::portfolio::PortfolioService;
use crate::services::pricing;
use crate::services::store::JsonStore;
use crate::sources::QuoteProvider;
use crate::types::{
    normalize_ticker, AssetClass, ChainExpiry, OptionContract, OptionExpiryEvent, OptionPosition,
    OptionQuote, OptionTransaction, OptionTxType, OptionType, OptionsData, CONTRACT_MULTIPLIER,
    EVENT_OPTIONS_EXPIRED,
};

/// The options trading engine.
pub struct OptionsEngine {
    state: Mutex<OptionsData>,
    store: JsonStore<OptionsData>,
    portfolio: Arc<PortfolioService>,
    source: Arc<dyn QuoteProvider>,
    broadcaster: Option<Arc<dyn Broadcaster>>,
}

impl OptionsEngine {
    /// Load the options aggregate from its store.
    pub fn new(
        store: JsonStore<OptionsData>,
        portfolio: Arc<PortfolioService>,
        source: Arc<dyn QuoteProvider>,
    ) -> Result<Self> {
        let state = store.load()?;
        Ok(Self {
            state: Mutex::new(state),
            store,
            portfolio,
            source,
            broadcaster: None,
        })
    }

    /// Attach an event sink for settlement broadcasts.
    pub fn with_broadcaster(mut self, broadcaster: Arc<dyn Broadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    /// Buy contracts at the current theoretical premium.
    pub async fn buy_option(
        &self,
        ticker: &str,
        option_type: OptionType,
        strike_price: f64,
        expiry_date: &str,
        contracts: u32,
    ) -> Result<OptionPosition> {
        let ticker = normalize_ticker(ticker);
        if contracts == 0 {
            return Err(EngineError::InvalidParam(
                "Contracts must be positive".to_string(),
            ));
        }
        if strike_price <= 0.0 {
            return Err(EngineError::InvalidParam(
                "Strike price must be positive".to_string(),
            ));
        }
        if pricing::days_to_expiry_signed(expiry_date) <= 0.0 {
            return Err(EngineError::InvalidParam(format!(
                "Expiry {} is in the past",
                expiry_date
            )));
        }

        let mut state = self.state.lock().await;

        let quote = self.source.fetch_quote(&ticker).await?;
        if quote.price <= 0.0 {
            return Err(EngineError::InvalidParam(format!(
                "No valid price for {}",
                ticker
            )));
        }

        let implied_vol = pricing::implied_vol(&ticker);
        let days_to_expiry = pricing::days_to_expiry(expiry_date);
        let premium_per_share = pricing::premium(
            quote.price,
            strike_price,
            days_to_expiry,
            implied_vol,
            option_type,
        );
        let total_premium = premium_per_share * CONTRACT_MULTIPLIER * contracts as f64;

        let available = self.portfolio.cash().await;
        if available < total_premium {
            return Err(EngineError::InsufficientFunds {
                needed: total_premium,
                available,
            });
        }

        self.portfolio.adjust_cash(-total_premium).await?;

        let now = chrono::Utc::now().to_rfc3339();
        let contract = OptionContract {
            underlying: ticker.clone(),
            option_type,
            strike_price,
            expiry_date: expiry_date.to_string(),
            multiplier: CONTRACT_MULTIPLIER,
            implied_vol,
        };
        let position = OptionPosition {
            id: uuid::Uuid::new_v4().to_string(),
            contract,
            asset_class: AssetClass::UsStockOption,
            contracts,
            premium_paid: total_premium,
            premium_per_share,
            current_premium: premium_per_share,
            current_value: total_premium,
            unrealized_pnl: 0.0,
            unrealized_pnl_percent: 0.0,
            days_to_expiry,
            opened_at: now.clone(),
            expiry_date: expiry_date.to_string(),
        };

        state.positions.push(position.clone());
        state.transactions.push(OptionTransaction {
            tx_type: OptionTxType::buy(option_type),
            underlying: ticker.clone(),
            strike_price,
            expiry_date: expiry_date.to_string(),
            contracts,
            premium_per_share,
            total_amount: total_premium,
            pnl: None,
            date: now,
        });

        self.store.save(&state).await?;
        info!(
            "Bought {} {} {} {} @ {:.2}/share",
            contracts,
            ticker,
            strike_price,
            option_type,
            premium_per_share
        );
        Ok(position)
    }

    /// Sell contracts back at the current theoretical premium. Returns the
    /// realized PnL on the sold contracts.
    pub async fn sell_option(&self, id: &str, contracts: Option<u32>) -> Result<f64> {
        let mut state = self.state.lock().await;

        let idx = state
            .positions
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("No open option position {}", id)))?;

        let (underlying, option_type, strike, expiry, held, premium_paid) = {
            let p = &state.positions[idx];
            (
                p.contract.underlying.clone(),
                p.contract.option_type,
                p.contract.strike_price,
                p.contract.expiry_date.clone(),
                p.contracts,
                p.premium_paid,
            )
        };

        let sell_contracts = contracts.unwrap_or(held);
        if sell_contracts == 0 || sell_contracts > held {
            return Err(EngineError::InvalidParam(format!(
                "Sell contracts must be in (0, {}]",
                held
            )));
        }

        let quote = self.source.fetch_quote(&underlying).await?;
        if quote.price <= 0.0 {
            return Err(EngineError::InvalidParam(format!(
                "No valid price for {}",
                underlying
            )));
        }

        let implied_vol = pricing::implied_vol(&underlying);
        let days_to_expiry = pricing::days_to_expiry(&expiry);
        let premium_per_share =
            pricing::premium(quote.price, strike, days_to_expiry, implied_vol, option_type);

        let proceeds = premium_per_share * CONTRACT_MULTIPLIER * sell_contracts as f64;
        let cost_basis = premium_paid / held as f64 * sell_contracts as f64;
        let pnl = proceeds - cost_basis;

        self.portfolio.adjust_cash(proceeds).await?;

        let now = chrono::Utc::now().to_rfc3339();
        if sell_contracts == held {
            state.positions.remove(idx);
        } else {
            let p = &mut state.positions[idx];
            p.contracts -= sell_contracts;
            p.premium_paid -= cost_basis;
        }

        state.transactions.push(OptionTransaction {
            tx_type: OptionTxType::sell(option_type),
            underlying: underlying.clone(),
            strike_price: strike,
            expiry_date: expiry,
            contracts: sell_contracts,
            premium_per_share,
            total_amount: proceeds,
            pnl: Some(pnl),
            date: now,
        });

        self.store.save(&state).await?;
        info!(
            "Sold {} {} contracts @ {:.2}/share (pnl {:.2})",
            sell_contracts, underlying, premium_per_share, pnl
        );
        Ok(pnl)
    }

    /// Cash-settle every position whose expiry instant has passed. A quote
    /// failure skips that position; it is retried on the next sweep.
    pub async fn settle_expired_options(&self) -> Result<Vec<OptionExpiryEvent>> {
        let mut state = self.state.lock().await;
        let mut events = Vec::new();

        let mut idx = 0;
        while idx < state.positions.len() {
            if pricing::days_to_expiry_signed(&state.positions[idx].expiry_date) > 0.0 {
                idx += 1;
                continue;
            }

            let underlying = state.positions[idx].contract.underlying.clone();
            let quote = match self.source.fetch_quote(&underlying).await {
                Ok(q) if q.price > 0.0 => q,
                Ok(_) | Err(_) => {
                    warn!("Settlement deferred for {}: no quote", underlying);
                    idx += 1;
                    continue;
                }
            };

            let position = state.positions.remove(idx);
            let intrinsic = pricing::intrinsic_value(
                quote.price,
                position.contract.strike_price,
                position.contract.option_type,
            );
            let settlement = intrinsic * CONTRACT_MULTIPLIER * position.contracts as f64;
            let itm = intrinsic > 0.0;

            if itm {
                self.portfolio.adjust_cash(settlement).await?;
            }

            let now = chrono::Utc::now().to_rfc3339();
            let pnl = settlement - position.premium_paid;
            state.transactions.push(OptionTransaction {
                tx_type: if itm {
                    OptionTxType::ExpireItm
                } else {
                    OptionTxType::ExpireOtm
                },
                underlying: underlying.clone(),
                strike_price: position.contract.strike_price,
                expiry_date: position.contract.expiry_date.clone(),
                contracts: position.contracts,
                premium_per_share: intrinsic,
                total_amount: settlement,
                pnl: Some(pnl),
                date: now.clone(),
            });

            let event = OptionExpiryEvent {
                underlying: underlying.clone(),
                symbol: position.contract.symbol(),
                strike_price: position.contract.strike_price,
                expiry_date: position.contract.expiry_date.clone(),
                contracts: position.contracts,
                settlement,
                pnl,
                itm,
                settled_at: now,
            };
            if let Some(ref broadcaster) = self.broadcaster {
                if let Ok(payload) = serde_json::to_value(&event) {
                    broadcaster.emit(EVENT_OPTIONS_EXPIRED, payload);
                }
            }
            info!(
                "Settled {} {} ({}, {:.2})",
                event.contracts,
                event.symbol,
                if itm { "ITM" } else { "OTM" },
                settlement
            );
            events.push(event);
        }

        if !events.is_empty() {
            self.store.save(&state).await?;
        }
        Ok(events)
    }

    /// Refresh premiums for all open positions and return a copy.
    /// Individual quote failures keep the last known premium.
    pub async fn get_positions(&self) -> Result<Vec<OptionPosition>> {
        let mut state = self.state.lock().await;

        let underlyings: BTreeSet<String> = state
            .positions
            .iter()
            .map(|p| p.contract.underlying.clone())
            .collect();

        for underlying in underlyings {
            let quote = match self.source.fetch_quote(&underlying).await {
                Ok(q) if q.price > 0.0 => q,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Premium refresh failed for {}: {}", underlying, e);
                    continue;
                }
            };

            for p in state
                .positions
                .iter_mut()
                .filter(|p| p.contract.underlying == quote.symbol)
            {
                let days_to_expiry = pricing::days_to_expiry(&p.contract.expiry_date);
                let premium = pricing::premium(
                    quote.price,
                    p.contract.strike_price,
                    days_to_expiry,
                    p.contract.implied_vol,
                    p.contract.option_type,
                );
                p.current_premium = premium;
                p.current_value = premium * CONTRACT_MULTIPLIER * p.contracts as f64;
                p.unrealized_pnl = p.current_value - p.premium_paid;
                p.unrealized_pnl_percent = if p.premium_paid > 0.0 {
                    p.unrealized_pnl / p.premium_paid * 100.0
                } else {
                    0.0
                };
                p.days_to_expiry = days_to_expiry;
            }
        }

        self.store.save(&state).await?;
        Ok(state.positions.clone())
    }

    /// Price one contract without trading.
    pub async fn get_quote(
        &self,
        ticker: &str,
        option_type: OptionType,
        strike_price: f64,
        expiry_date: &str,
    ) -> Result<OptionQuote> {
        let ticker = normalize_ticker(ticker);
        let quote = self.source.fetch_quote(&ticker).await?;
        if quote.price <= 0.0 {
            return Err(EngineError::InvalidParam(format!(
                "No valid price for {}",
                ticker
            )));
        }

        let implied_vol = pricing::implied_vol(&ticker);
        let days_to_expiry = pricing::days_to_expiry(expiry_date);
        let intrinsic = pricing::intrinsic_value(quote.price, strike_price, option_type);
        let time_value = pricing::time_value(quote.price, implied_vol, days_to_expiry);
        let premium = intrinsic + time_value;

        Ok(OptionQuote {
            premium_per_share: pricing::round2(premium),
            premium_per_contract: pricing::round2(premium * CONTRACT_MULTIPLIER),
            intrinsic_value: pricing::round2(intrinsic),
            time_value: pricing::round2(time_value),
            days_to_expiry: (days_to_expiry * 10.0).round() / 10.0,
            implied_vol,
        })
    }

    /// Generate an expiry/strike chain for an underlying at a given price.
    pub fn generate_chain(&self, ticker: &str, price: f64) -> Vec<ChainExpiry> {
        let implied_vol = pricing::implied_vol(ticker);
        chain::generate_chain(price, implied_vol)
    }

    /// Most recent options transactions, newest first.
    pub async fn get_transactions(&self, limit: usize) -> Vec<OptionTransaction> {
        let state = self.state.lock().await;
        state.transactions.iter().rev().take(limit).cloned().collect()
    }

    /// Wipe the aggregate back to defaults.
    pub async fn reset(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = OptionsData::default();
        self.store.save(&state).await?;
        Ok(())
    }
}
