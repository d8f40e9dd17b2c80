use std::sync::Arc;
use std::time::Duration;

use clawtrade::config::Config;
use clawtrade::services::{
    ChannelBroadcaster, ExpirySettler, FuturesEngine, JsonStore, LiquidationMonitor,
    OptionsEngine, PortfolioService, SnapshotService, WatchlistService,
};
use clawtrade::sources::{BinanceQuoteClient, QuoteProvider, YahooQuoteClient};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clawtrade=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env());
    info!("Starting engine, data dir {}", config.data_dir.display());

    let quote_ttl = Duration::from_secs(config.quote_ttl_secs);
    let crypto_source: Arc<dyn QuoteProvider> = Arc::new(BinanceQuoteClient::new(
        config.binance_api_key.clone(),
        quote_ttl,
    ));
    let stock_source: Arc<dyn QuoteProvider> = Arc::new(YahooQuoteClient::new(quote_ttl));

    let broadcaster = Arc::new(ChannelBroadcaster::new());

    let portfolio = Arc::new(PortfolioService::new(JsonStore::new(
        config.data_dir.join("portfolio.json"),
    ))?);
    let futures = Arc::new(FuturesEngine::new(
        JsonStore::new(config.data_dir.join("futures-positions.json")),
        portfolio.clone(),
        crypto_source.clone(),
    )?);
    let options = Arc::new(
        OptionsEngine::new(
            JsonStore::new(config.data_dir.join("options-positions.json")),
            portfolio.clone(),
            stock_source.clone(),
        )?
        .with_broadcaster(broadcaster.clone()),
    );
    let watchlist = Arc::new(WatchlistService::new(JsonStore::new(
        config.data_dir.join("watchlist.json"),
    ))?);

    let snapshot = SnapshotService::new(
        portfolio.clone(),
        crypto_source.clone(),
        stock_source.clone(),
        Some(futures.clone()),
        Some(options.clone()),
    );

    info!("Watchlist entries: {}", watchlist.entries().await.len());

    // Background monitors with a shared stop signal.
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let liquidation_handle = LiquidationMonitor::new(
        futures.clone(),
        crypto_source.clone(),
        Some(broadcaster.clone()),
        Duration::from_secs(config.liquidation_interval_secs),
    )
    .spawn(stop_rx.clone());
    let settler_handle = ExpirySettler::new(
        options.clone(),
        Duration::from_secs(config.settle_interval_secs),
    )
    .spawn(stop_rx);

    // Log emitted domain events until shutdown.
    let mut events = broadcaster.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!("Event {}: {}", event.event, event.payload);
        }
    });

    info!("Engine running; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    let _ = stop_tx.send(true);
    let _ = liquidation_handle.await;
    let _ = settler_handle.await;

    // Final snapshot records today's equity before exit.
    let final_snapshot = snapshot.get_enriched_snapshot().await;
    info!(
        "Total equity at shutdown: {:.2} (cash {:.2})",
        final_snapshot.total_equity, final_snapshot.cash
    );

    Ok(())
}
