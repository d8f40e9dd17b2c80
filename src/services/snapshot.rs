//! Snapshot Aggregator
//!
//! Builds the unified read model across the ledger and both engines:
//! enriched spot holdings, live futures and options positions, total equity,
//! and day-over-day change. Quote failures degrade to average-price
//! valuations instead of failing the snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::services::futures::FuturesEngine;
use crate::services::options::OptionsEngine;
use crate::services::portfolio::PortfolioService;
use crate::services::spot::crypto_symbol;
use crate::sources::QuoteProvider;
use crate::types::{
    AssetClass, DayChange, PortfolioSnapshot, SpotHoldingView, SpotTransaction, UnifiedPosition,
};

/// Maximum recent transactions embedded per holding.
const RECENT_TX_CAP: usize = 10;

/// Aggregates the ledger and engines into one snapshot.
pub struct SnapshotService {
    portfolio: Arc<PortfolioService>,
    crypto_source: Arc<dyn QuoteProvider>,
    stock_source: Arc<dyn QuoteProvider>,
    futures: Option<Arc<FuturesEngine>>,
    options: Option<Arc<OptionsEngine>>,
}

impl SnapshotService {
    pub fn new(
        portfolio: Arc<PortfolioService>,
        crypto_source: Arc<dyn QuoteProvider>,
        stock_source: Arc<dyn QuoteProvider>,
        futures: Option<Arc<FuturesEngine>>,
        options: Option<Arc<OptionsEngine>>,
    ) -> Self {
        Self {
            portfolio,
            crypto_source,
            stock_source,
            futures,
            options,
        }
    }

    /// Build the unified snapshot and record today's daily value sample.
    pub async fn get_enriched_snapshot(&self) -> PortfolioSnapshot {
        let state = self.portfolio.snapshot().await;

        // Bulk-fetch prices per source; failed symbols come back at zero and
        // fall through to the holding's average price.
        let (crypto_tickers, stock_tickers): (Vec<String>, Vec<String>) = {
            let mut crypto = Vec::new();
            let mut stock = Vec::new();
            for (ticker, holding) in &state.holdings {
                match holding.asset_class {
                    AssetClass::UsStockSpot => stock.push(ticker.clone()),
                    _ => crypto.push(ticker.clone()),
                }
            }
            (crypto, stock)
        };

        let mut prices: HashMap<String, f64> = HashMap::new();
        let crypto_symbols: Vec<String> =
            crypto_tickers.iter().map(|t| crypto_symbol(t)).collect();
        for (ticker, quote) in crypto_tickers
            .iter()
            .zip(self.crypto_source.fetch_quotes(&crypto_symbols).await)
        {
            if quote.price > 0.0 {
                prices.insert(ticker.clone(), quote.price);
            }
        }
        for (ticker, quote) in stock_tickers
            .iter()
            .zip(self.stock_source.fetch_quotes(&stock_tickers).await)
        {
            if quote.price > 0.0 {
                prices.insert(ticker.clone(), quote.price);
            }
        }

        let mut spot_holdings: Vec<SpotHoldingView> = state
            .holdings
            .iter()
            .map(|(ticker, holding)| {
                let current_price = prices
                    .get(ticker)
                    .copied()
                    .unwrap_or(holding.average_price);
                let market_value = holding.quantity * current_price;
                let cost_basis = holding.quantity * holding.average_price;
                let pnl = market_value - cost_basis;
                let meta = state.holding_meta.get(ticker);
                let recent_transactions: Vec<SpotTransaction> = state
                    .transaction_history
                    .iter()
                    .rev()
                    .filter(|tx| &tx.ticker == ticker)
                    .take(RECENT_TX_CAP)
                    .cloned()
                    .collect();

                SpotHoldingView {
                    ticker: ticker.clone(),
                    asset_class: holding.asset_class,
                    quantity: holding.quantity,
                    average_price: holding.average_price,
                    current_price,
                    market_value,
                    cost_basis,
                    pnl,
                    pnl_percent: if cost_basis > 0.0 {
                        pnl / cost_basis * 100.0
                    } else {
                        0.0
                    },
                    thesis: meta.and_then(|m| m.thesis.clone()),
                    context: meta.and_then(|m| m.context.clone()),
                    recent_transactions,
                }
            })
            .collect();
        spot_holdings.sort_by(|a, b| a.ticker.cmp(&b.ticker));

        let futures_positions = match &self.futures {
            Some(engine) => engine.get_positions().await.unwrap_or_else(|e| {
                warn!("Futures refresh failed in snapshot: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };
        let futures_account = match &self.futures {
            Some(engine) => Some(engine.get_account().await),
            None => None,
        };

        let option_positions = match &self.options {
            Some(engine) => engine.get_positions().await.unwrap_or_else(|e| {
                warn!("Options refresh failed in snapshot: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        let spot_equity: f64 = spot_holdings.iter().map(|h| h.market_value).sum();
        let futures_margin_used: f64 = futures_positions.iter().map(|p| p.initial_margin).sum();
        let futures_unrealized_pnl: f64 =
            futures_positions.iter().map(|p| p.unrealized_pnl).sum();
        let options_value: f64 = option_positions.iter().map(|p| p.current_value).sum();

        let total_equity =
            state.cash + spot_equity + futures_margin_used + futures_unrealized_pnl + options_value;

        let mut all_positions: Vec<UnifiedPosition> = Vec::new();
        all_positions.extend(spot_holdings.iter().map(|h| UnifiedPosition {
            symbol: h.ticker.clone(),
            asset_class: h.asset_class,
            quantity: h.quantity,
            value: h.market_value,
            pnl: h.pnl,
        }));
        all_positions.extend(futures_positions.iter().map(|p| UnifiedPosition {
            symbol: p.ticker.clone(),
            asset_class: p.asset_class,
            quantity: p.quantity,
            value: p.initial_margin + p.unrealized_pnl,
            pnl: p.unrealized_pnl,
        }));
        all_positions.extend(option_positions.iter().map(|p| UnifiedPosition {
            symbol: p.contract.symbol(),
            asset_class: p.asset_class,
            quantity: p.contracts as f64,
            value: p.current_value,
            pnl: p.unrealized_pnl,
        }));
        all_positions.sort_by(|a, b| {
            b.pnl
                .abs()
                .partial_cmp(&a.pnl.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let day_change = state
            .daily_snapshots
            .iter()
            .rev()
            .find(|s| s.date != today)
            .map(|prev| {
                let change = total_equity - prev.total_value;
                DayChange {
                    previous_date: prev.date.clone(),
                    previous_value: prev.total_value,
                    change,
                    change_percent: if prev.total_value > 0.0 {
                        change / prev.total_value * 100.0
                    } else {
                        0.0
                    },
                }
            });

        if let Err(e) = self.portfolio.record_daily_snapshot(total_equity).await {
            warn!("Daily snapshot record failed: {}", e);
        }

        PortfolioSnapshot {
            cash: state.cash,
            spot_equity,
            futures_margin_used,
            futures_unrealized_pnl,
            options_value,
            total_equity,
            spot_holdings,
            futures_positions,
            futures_account,
            option_positions,
            all_positions,
            day_change,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
