//! Yahoo Finance client for stock quotes.
//!
//! Accepts bare tickers (e.g. `AAPL`). Uses the unofficial chart endpoint
//! and reads the regular market price from the response metadata.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::services::cache::Cache;
use crate::sources::QuoteProvider;
use crate::types::Quote;

/// Yahoo Finance chart response.
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    meta: YahooMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct YahooMeta {
    symbol: String,
    regular_market_price: Option<f64>,
}

/// Normalize symbol for the Yahoo Finance API.
/// Yahoo uses hyphens instead of dots for share classes (e.g. BRK-B not BRK.B).
fn normalize_yahoo_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase().replace('.', "-")
}

/// Yahoo Finance stock quote client with a short-TTL cache.
pub struct YahooQuoteClient {
    client: Client,
    cache: Cache<f64>,
}

impl YahooQuoteClient {
    pub fn new(cache_ttl: Duration) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            cache: Cache::new(cache_ttl),
        }
    }
}

#[async_trait]
impl QuoteProvider for YahooQuoteClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        let ticker = symbol.trim().to_uppercase();

        if let Some(price) = self.cache.get(&ticker) {
            return Ok(Quote::new(ticker, price));
        }

        let url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{}?range=1d&interval=1d&includePrePost=false",
            normalize_yahoo_symbol(&ticker)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EngineError::Network(format!("Yahoo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(EngineError::Network(format!(
                "Yahoo API error for {}: {}",
                ticker,
                response.status()
            )));
        }

        let data: YahooChartResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Network(format!("Yahoo parse error: {}", e)))?;

        if let Some(error) = data.chart.error {
            return Err(EngineError::Network(format!(
                "Yahoo API error: {} - {}",
                error.code, error.description
            )));
        }

        let price = data
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .and_then(|r| r.meta.regular_market_price)
            .ok_or_else(|| EngineError::Network(format!("No market price for {}", ticker)))?;

        debug!("Yahoo quote: {} = ${}", ticker, price);
        self.cache.set(ticker.clone(), price);

        Ok(Quote::new(ticker, price))
    }

    fn clear_cache(&self) {
        self.cache.clear();
    }
}
