//! Spot Engine
//!
//! Validates and executes spot buys and sells, routing quote lookups to the
//! crypto or stock source. Crypto tickers are stored as the base symbol and
//! queried with a `USDT` suffix. All cash and holding mutations are
//! delegated to the portfolio ledger.

use std::sync::Arc;

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::services::portfolio::PortfolioService;
use crate::sources::QuoteProvider;
use crate::types::{normalize_ticker, AssetType, Quote, SpotTransaction};

/// Crypto request symbol for a base ticker.
pub fn crypto_symbol(ticker: &str) -> String {
    let ticker = normalize_ticker(ticker);
    if ticker.ends_with("USDT") {
        ticker
    } else {
        format!("{}USDT", ticker)
    }
}

/// The spot trading engine.
pub struct SpotEngine {
    portfolio: Arc<PortfolioService>,
    crypto_source: Arc<dyn QuoteProvider>,
    stock_source: Arc<dyn QuoteProvider>,
}

impl SpotEngine {
    pub fn new(
        portfolio: Arc<PortfolioService>,
        crypto_source: Arc<dyn QuoteProvider>,
        stock_source: Arc<dyn QuoteProvider>,
    ) -> Self {
        Self {
            portfolio,
            crypto_source,
            stock_source,
        }
    }

    /// Routing hint for a ticker: explicit parameter, then the recorded
    /// ticker type, then crypto.
    async fn resolve_type(&self, ticker: &str, asset_type: Option<AssetType>) -> AssetType {
        if let Some(asset_type) = asset_type {
            return asset_type;
        }
        self.portfolio.ticker_type(ticker).await.unwrap_or_default()
    }

    /// Fetch the current price for a ticker through the right source.
    async fn fetch_price(&self, ticker: &str, asset_type: AssetType) -> Result<f64> {
        let quote = match asset_type {
            AssetType::Crypto => self.crypto_source.fetch_quote(&crypto_symbol(ticker)).await?,
            AssetType::Stock => self.stock_source.fetch_quote(ticker).await?,
        };
        if quote.price <= 0.0 {
            return Err(EngineError::InvalidParam(format!(
                "No valid price for {}",
                ticker
            )));
        }
        Ok(quote.price)
    }

    /// Buy at the current quote. Returns the appended ledger transaction.
    pub async fn execute_buy(
        &self,
        ticker: &str,
        quantity: f64,
        reasoning: Option<String>,
        asset_type: Option<AssetType>,
    ) -> Result<SpotTransaction> {
        let ticker = normalize_ticker(ticker);
        let resolved = self.resolve_type(&ticker, asset_type).await;
        let price = self.fetch_price(&ticker, resolved).await?;
        debug!("Spot buy {} {} @ {} ({})", quantity, ticker, price, resolved);
        self.portfolio
            .buy_spot(&ticker, quantity, price, reasoning, asset_type)
            .await
    }

    /// Sell at the current quote. Returns the appended ledger transaction.
    pub async fn execute_sell(
        &self,
        ticker: &str,
        quantity: f64,
        reasoning: Option<String>,
    ) -> Result<SpotTransaction> {
        let ticker = normalize_ticker(ticker);
        let resolved = self.resolve_type(&ticker, None).await;
        let price = self.fetch_price(&ticker, resolved).await?;
        debug!("Spot sell {} {} @ {} ({})", quantity, ticker, price, resolved);
        self.portfolio
            .sell_spot(&ticker, quantity, price, reasoning)
            .await
    }

    /// Quote a single symbol without trading.
    pub async fn quote(&self, symbol: &str, asset_type: Option<AssetType>) -> Result<Quote> {
        let ticker = normalize_ticker(symbol);
        let resolved = self.resolve_type(&ticker, asset_type).await;
        match resolved {
            AssetType::Crypto => self.crypto_source.fetch_quote(&crypto_symbol(&ticker)).await,
            AssetType::Stock => self.stock_source.fetch_quote(&ticker).await,
        }
    }

    /// Quote several symbols; individual failures yield zero prices.
    pub async fn quotes(&self, symbols: &[String], asset_type: Option<AssetType>) -> Vec<Quote> {
        let resolved = asset_type.unwrap_or_default();
        match resolved {
            AssetType::Crypto => {
                let symbols: Vec<String> = symbols.iter().map(|s| crypto_symbol(s)).collect();
                self.crypto_source.fetch_quotes(&symbols).await
            }
            AssetType::Stock => {
                let symbols: Vec<String> = symbols.iter().map(|s| normalize_ticker(s)).collect();
                self.stock_source.fetch_quotes(&symbols).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_symbol_appends_usdt() {
        assert_eq!(crypto_symbol("BTC"), "BTCUSDT");
        assert_eq!(crypto_symbol("eth"), "ETHUSDT");
    }

    #[test]
    fn test_crypto_symbol_keeps_existing_suffix() {
        assert_eq!(crypto_symbol("BTCUSDT"), "BTCUSDT");
        assert_eq!(crypto_symbol("solusdt"), "SOLUSDT");
    }
}
