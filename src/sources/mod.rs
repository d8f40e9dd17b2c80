//! Market data sources.
//!
//! The engines consume only the [`QuoteProvider`] capability; the concrete
//! clients here are the production implementations. Tests substitute a
//! deterministic provider.

pub mod binance;
pub mod yahoo;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Quote;

pub use binance::BinanceQuoteClient;
pub use yahoo::YahooQuoteClient;

/// Capability for fetching spot prices.
///
/// Symbols are normalized to upper-case. Implementations keep a short-TTL
/// process-local cache keyed by the normalized symbol.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch the current price for one symbol.
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote>;

    /// Fetch prices for several symbols. An individual failure yields
    /// `price = 0` for that symbol without failing the batch.
    async fn fetch_quotes(&self, symbols: &[String]) -> Vec<Quote> {
        let mut quotes = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match self.fetch_quote(symbol).await {
                Ok(quote) => quotes.push(quote),
                Err(_) => quotes.push(Quote::new(symbol.trim().to_uppercase(), 0.0)),
            }
        }
        quotes
    }

    /// Drop all cached quotes.
    fn clear_cache(&self) {}
}
