//! Background monitors.
//!
//! The liquidation monitor sweeps futures positions against fresh marks
//! every few seconds; the expiry settler sweeps expired options hourly.
//! Both skip overlapping ticks and survive per-tick errors; a stop signal
//! shuts them down.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::services::broadcaster::Broadcaster;
use crate::services::futures::FuturesEngine;
use crate::services::options::OptionsEngine;
use crate::services::spot::crypto_symbol;
use crate::sources::QuoteProvider;
use crate::types::{PositionSide, EVENT_FUTURES_LIQUIDATION};

/// Periodic forced-liquidation sweep over open futures positions.
pub struct LiquidationMonitor {
    futures: Arc<FuturesEngine>,
    source: Arc<dyn QuoteProvider>,
    broadcaster: Option<Arc<dyn Broadcaster>>,
    interval: Duration,
}

impl LiquidationMonitor {
    pub fn new(
        futures: Arc<FuturesEngine>,
        source: Arc<dyn QuoteProvider>,
        broadcaster: Option<Arc<dyn Broadcaster>>,
        interval: Duration,
    ) -> Self {
        Self {
            futures,
            source,
            broadcaster,
            interval,
        }
    }

    /// Run the sweep loop until the stop signal fires.
    pub fn spawn(self, mut stop: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => self.sweep().await,
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            debug!("Liquidation monitor stopping");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// One sweep: fetch a mark per ticker and liquidate every position the
    /// mark has crossed. Tickers whose quote fails are left untouched so a
    /// stale price never triggers a liquidation.
    pub async fn sweep(&self) {
        let positions = self.futures.positions_snapshot().await;
        if positions.is_empty() {
            return;
        }

        let mut marks: HashMap<String, f64> = HashMap::new();
        for ticker in positions.iter().map(|p| p.ticker.clone()) {
            if marks.contains_key(&ticker) {
                continue;
            }
            match self.source.fetch_quote(&crypto_symbol(&ticker)).await {
                Ok(quote) if quote.price > 0.0 => {
                    marks.insert(ticker, quote.price);
                }
                Ok(_) => {}
                Err(e) => warn!("Liquidation sweep: no mark for {}: {}", ticker, e),
            }
        }

        for position in positions {
            let Some(&mark) = marks.get(&position.ticker) else {
                continue;
            };
            let triggered = match position.side {
                PositionSide::Long => mark <= position.liquidation_price,
                PositionSide::Short => mark >= position.liquidation_price,
            };
            if !triggered {
                continue;
            }

            match self.futures.liquidate_position(&position.id, mark).await {
                Ok(Some(event)) => {
                    if let Some(ref broadcaster) = self.broadcaster {
                        if let Ok(payload) = serde_json::to_value(&event) {
                            broadcaster.emit(EVENT_FUTURES_LIQUIDATION, payload);
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Liquidation of {} failed: {}", position.id, e),
            }
        }
    }
}

/// Periodic settlement sweep over expired options.
pub struct ExpirySettler {
    options: Arc<OptionsEngine>,
    interval: Duration,
}

impl ExpirySettler {
    pub fn new(options: Arc<OptionsEngine>, interval: Duration) -> Self {
        Self { options, interval }
    }

    /// Run the settlement loop until the stop signal fires.
    pub fn spawn(self, mut stop: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.options.settle_expired_options().await {
                            warn!("Expiry settlement sweep failed: {}", e);
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            debug!("Expiry settler stopping");
                            break;
                        }
                    }
                }
            }
        })
    }
}
