//! Binance REST client for crypto spot quotes.
//!
//! Accepts symbols of the form `BASEQUOTE` (e.g. `BTCUSDT`). Public price
//! endpoints work without an API key.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::services::cache::Cache;
use crate::sources::QuoteProvider;
use crate::types::Quote;

const BINANCE_API_URL: &str = "https://api.binance.com/api/v3";

/// Binance ticker price response.
#[derive(Debug, Deserialize)]
struct BinancePrice {
    symbol: String,
    price: String,
}

/// Binance spot quote client with a short-TTL cache.
pub struct BinanceQuoteClient {
    client: Client,
    api_key: Option<String>,
    cache: Cache<f64>,
}

impl BinanceQuoteClient {
    pub fn new(api_key: Option<String>, cache_ttl: Duration) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("Clawtrade/1.0")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            cache: Cache::new(cache_ttl),
        }
    }
}

#[async_trait]
impl QuoteProvider for BinanceQuoteClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        let symbol = symbol.trim().to_uppercase();

        if let Some(price) = self.cache.get(&symbol) {
            return Ok(Quote::new(symbol, price));
        }

        let url = format!("{}/ticker/price?symbol={}", BINANCE_API_URL, symbol);
        let mut request = self.client.get(&url);
        if let Some(ref key) = self.api_key {
            request = request.header("X-MBX-APIKEY", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EngineError::Network(format!("Binance request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(EngineError::Network(format!(
                "Binance API error for {}: {}",
                symbol,
                response.status()
            )));
        }

        let ticker: BinancePrice = response
            .json()
            .await
            .map_err(|e| EngineError::Network(format!("Binance parse error: {}", e)))?;

        let price: f64 = ticker
            .price
            .parse()
            .map_err(|_| EngineError::Network(format!("Bad price for {}: {}", symbol, ticker.price)))?;

        debug!("Binance quote: {} = ${}", ticker.symbol, price);
        self.cache.set(symbol.clone(), price);

        Ok(Quote::new(symbol, price))
    }

    fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binance_price_deserialization() {
        let json = r#"{"symbol": "BTCUSDT", "price": "60000.50"}"#;
        let ticker: BinancePrice = serde_json::from_str(json).unwrap();
        assert_eq!(ticker.symbol, "BTCUSDT");
        assert_eq!(ticker.price, "60000.50");
    }

    #[test]
    fn test_binance_price_parse() {
        let json = r#"{"symbol": "ETHUSDT", "price": "3500.00"}"#;
        let ticker: BinancePrice = serde_json::from_str(json).unwrap();
        let price: f64 = ticker.price.parse().unwrap();
        assert_eq!(price, 3_500.0);
    }

    #[test]
    fn test_client_creation() {
        let _client = BinanceQuoteClient::new(None, Duration::from_secs(30));
    }
}
