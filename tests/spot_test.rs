//! Spot engine integration tests: routing, weighted averages, and the
//! cash/holding invariants.

mod common;

use clawtrade::error::EngineError;
use clawtrade::types::{AssetClass, AssetType, SpotTxType};
use common::TestStack;

#[tokio::test]
async fn test_stock_buy_weighted_average() {
    let stack = TestStack::new();
    stack.stocks.set("AAPL", 150.0);

    stack
        .spot
        .execute_buy("AAPL", 10.0, None, Some(AssetType::Stock))
        .await
        .unwrap();

    stack.stocks.set("AAPL", 160.0);
    stack.spot.execute_buy("AAPL", 10.0, None, None).await.unwrap();

    let state = stack.portfolio.snapshot().await;
    let holding = state.holdings.get("AAPL").unwrap();
    assert_eq!(holding.quantity, 20.0);
    assert!((holding.average_price - 155.0).abs() < 1e-9);
    assert_eq!(holding.asset_class, AssetClass::UsStockSpot);
    assert!((state.cash - 96_900.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_crypto_routing_appends_usdt() {
    let stack = TestStack::new();
    stack.crypto.set("ETHUSDT", 3_500.0);

    stack
        .spot
        .execute_buy("ETH", 1.0, None, Some(AssetType::Crypto))
        .await
        .unwrap();

    // The quote request went out as the USDT pair.
    assert!(stack.crypto.requests().contains(&"ETHUSDT".to_string()));

    // The holding is stored under the base ticker.
    let state = stack.portfolio.snapshot().await;
    let holding = state.holdings.get("ETH").unwrap();
    assert_eq!(holding.asset_class, AssetClass::CryptoSpot);
    assert!((state.cash - 96_500.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_default_routing_is_crypto() {
    let stack = TestStack::new();
    stack.crypto.set("SOLUSDT", 150.0);

    stack.spot.execute_buy("sol", 2.0, None, None).await.unwrap();

    let state = stack.portfolio.snapshot().await;
    assert_eq!(
        state.holdings.get("SOL").unwrap().asset_class,
        AssetClass::CryptoSpot
    );
}

#[tokio::test]
async fn test_recorded_ticker_type_routes_later_orders() {
    let stack = TestStack::new();
    stack.stocks.set("NVDA", 800.0);

    stack
        .spot
        .execute_buy("NVDA", 1.0, None, Some(AssetType::Stock))
        .await
        .unwrap();

    // Sell without a type hint must route back to the stock source.
    stack.stocks.set("NVDA", 850.0);
    let tx = stack.spot.execute_sell("NVDA", 1.0, None).await.unwrap();
    assert_eq!(tx.tx_type, SpotTxType::Sell);
    assert_eq!(tx.price, 850.0);
}

#[tokio::test]
async fn test_quote_failure_is_network_error() {
    let stack = TestStack::new();
    stack.crypto.set_failing("BTCUSDT");

    let err = stack.spot.execute_buy("BTC", 1.0, None, None).await.unwrap_err();
    assert!(matches!(err, EngineError::Network(_)));

    // Nothing was mutated.
    let state = stack.portfolio.snapshot().await;
    assert_eq!(state.cash, 100_000.0);
    assert!(state.holdings.is_empty());
    assert!(state.transaction_history.is_empty());
}

#[tokio::test]
async fn test_zero_price_rejected() {
    let stack = TestStack::new();
    stack.crypto.set("BTCUSDT", 0.0);

    let err = stack.spot.execute_buy("BTC", 1.0, None, None).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidParam(_)));
}

#[tokio::test]
async fn test_sell_more_than_held_rejected() {
    let stack = TestStack::new();
    stack.crypto.set("BTCUSDT", 60_000.0);

    stack.spot.execute_buy("BTC", 0.5, None, None).await.unwrap();
    let err = stack.spot.execute_sell("BTC", 1.0, None).await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientHoldings { .. }));
}

#[tokio::test]
async fn test_buy_with_reasoning_recorded() {
    let stack = TestStack::new();
    stack.crypto.set("BTCUSDT", 60_000.0);

    let tx = stack
        .spot
        .execute_buy("BTC", 0.1, Some("halving play".to_string()), None)
        .await
        .unwrap();
    assert_eq!(tx.reasoning.as_deref(), Some("halving play"));

    let txs = stack.portfolio.transactions(10).await;
    assert_eq!(txs[0].reasoning.as_deref(), Some("halving play"));
}

#[tokio::test]
async fn test_cash_never_negative_across_operations() {
    let stack = TestStack::new();
    stack.crypto.set("BTCUSDT", 60_000.0);

    stack.spot.execute_buy("BTC", 1.0, None, None).await.unwrap();
    let err = stack.spot.execute_buy("BTC", 10.0, None, None).await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds { .. }));

    assert!(stack.portfolio.cash().await >= 0.0);
}

#[tokio::test]
async fn test_quote_endpoint_routes_by_type() {
    let stack = TestStack::new();
    stack.crypto.set("BTCUSDT", 60_000.0);
    stack.stocks.set("AAPL", 150.0);

    let btc = stack.spot.quote("btc", Some(AssetType::Crypto)).await.unwrap();
    assert_eq!(btc.symbol, "BTCUSDT");
    assert_eq!(btc.price, 60_000.0);

    let aapl = stack.spot.quote("AAPL", Some(AssetType::Stock)).await.unwrap();
    assert_eq!(aapl.symbol, "AAPL");
    assert_eq!(aapl.price, 150.0);
}

#[tokio::test]
async fn test_bulk_quotes_tolerate_individual_failure() {
    let stack = TestStack::new();
    stack.crypto.set("BTCUSDT", 60_000.0);
    stack.crypto.set_failing("ETHUSDT");

    let quotes = stack
        .spot
        .quotes(
            &["BTC".to_string(), "ETH".to_string()],
            Some(AssetType::Crypto),
        )
        .await;

    assert_eq!(quotes.len(), 2);
    assert_eq!(quotes[0].price, 60_000.0);
    assert_eq!(quotes[1].price, 0.0);
}
