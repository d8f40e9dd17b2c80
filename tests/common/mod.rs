//! Shared test fixtures: a deterministic quote provider and a fully wired
//! engine stack backed by a temp data directory.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;
use tempfile::TempDir;

use clawtrade::error::{EngineError, Result};
use clawtrade::services::{
    FuturesEngine, JsonStore, OptionsEngine, PortfolioService, SpotEngine,
};
use clawtrade::sources::QuoteProvider;
use clawtrade::types::Quote;

/// Deterministic in-memory quote source.
pub struct MockQuoteProvider {
    prices: DashMap<String, f64>,
    failing: DashMap<String, ()>,
    requests: Mutex<Vec<String>>,
}

impl MockQuoteProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            prices: DashMap::new(),
            failing: DashMap::new(),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Set the price returned for a symbol.
    pub fn set(&self, symbol: &str, price: f64) {
        self.prices.insert(symbol.to_uppercase(), price);
        self.failing.remove(&symbol.to_uppercase());
    }

    /// Make fetches for a symbol fail.
    pub fn set_failing(&self, symbol: &str) {
        self.failing.insert(symbol.to_uppercase(), ());
    }

    /// Symbols requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuoteProvider for MockQuoteProvider {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        let symbol = symbol.trim().to_uppercase();
        self.requests.lock().unwrap().push(symbol.clone());

        if self.failing.contains_key(&symbol) {
            return Err(EngineError::Network(format!("mock failure for {}", symbol)));
        }
        match self.prices.get(&symbol) {
            Some(price) => Ok(Quote::new(symbol, *price)),
            None => Err(EngineError::Network(format!("no mock price for {}", symbol))),
        }
    }
}

/// A fully wired engine stack over a temp directory.
pub struct TestStack {
    pub dir: TempDir,
    pub crypto: Arc<MockQuoteProvider>,
    pub stocks: Arc<MockQuoteProvider>,
    pub portfolio: Arc<PortfolioService>,
    pub spot: SpotEngine,
    pub futures: Arc<FuturesEngine>,
    pub options: Arc<OptionsEngine>,
}

impl TestStack {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let crypto = MockQuoteProvider::new();
        let stocks = MockQuoteProvider::new();

        let portfolio = Arc::new(
            PortfolioService::new(JsonStore::new(dir.path().join("portfolio.json"))).unwrap(),
        );
        let spot = SpotEngine::new(
            portfolio.clone(),
            crypto.clone() as Arc<dyn QuoteProvider>,
            stocks.clone() as Arc<dyn QuoteProvider>,
        );
        let futures = Arc::new(
            FuturesEngine::new(
                JsonStore::new(dir.path().join("futures-positions.json")),
                portfolio.clone(),
                crypto.clone() as Arc<dyn QuoteProvider>,
            )
            .unwrap(),
        );
        let options = Arc::new(
            OptionsEngine::new(
                JsonStore::new(dir.path().join("options-positions.json")),
                portfolio.clone(),
                stocks.clone() as Arc<dyn QuoteProvider>,
            )
            .unwrap(),
        );

        Self {
            dir,
            crypto,
            stocks,
            portfolio,
            spot,
            futures,
            options,
        }
    }
}

/// `YYYY-MM-DD` a number of days from today (negative for the past).
pub fn date_from_today(days: i64) -> String {
    (chrono::Utc::now() + chrono::Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}
