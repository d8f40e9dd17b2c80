//! Watchlist store.
//!
//! A small persisted list of tickers with optional notes. The engine only
//! stores it; enrichment of watchlist entries happens upstream.

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::services::store::JsonStore;
use crate::types::normalize_ticker;

/// One watched ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub added_at: String,
}

/// The persisted watchlist aggregate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistData {
    #[serde(default)]
    pub entries: Vec<WatchlistEntry>,
}

/// The watchlist service.
pub struct WatchlistService {
    state: Mutex<WatchlistData>,
    store: JsonStore<WatchlistData>,
}

impl WatchlistService {
    pub fn new(store: JsonStore<WatchlistData>) -> Result<Self> {
        let state = store.load()?;
        Ok(Self {
            state: Mutex::new(state),
            store,
        })
    }

    /// Add or update a watched ticker.
    pub async fn add(&self, ticker: &str, note: Option<String>) -> Result<WatchlistEntry> {
        let ticker = normalize_ticker(ticker);
        let mut state = self.state.lock().await;

        let entry = match state.entries.iter_mut().find(|e| e.ticker == ticker) {
            Some(existing) => {
                if note.is_some() {
                    existing.note = note;
                }
                existing.clone()
            }
            None => {
                let entry = WatchlistEntry {
                    ticker,
                    note,
                    added_at: chrono::Utc::now().to_rfc3339(),
                };
                state.entries.push(entry.clone());
                entry
            }
        };

        self.store.save(&state).await?;
        Ok(entry)
    }

    /// Remove a watched ticker. Returns whether it was present.
    pub async fn remove(&self, ticker: &str) -> Result<bool> {
        let ticker = normalize_ticker(ticker);
        let mut state = self.state.lock().await;

        let before = state.entries.len();
        state.entries.retain(|e| e.ticker != ticker);
        let removed = state.entries.len() != before;

        if removed {
            self.store.save(&state).await?;
        }
        Ok(removed)
    }

    /// All watched tickers in insertion order.
    pub async fn entries(&self) -> Vec<WatchlistEntry> {
        self.state.lock().await.entries.clone()
    }
}
