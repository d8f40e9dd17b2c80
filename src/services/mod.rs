pub mod broadcaster;
pub mod cache;
pub mod chain;
pub mod futures;
pub mod margin;
pub mod monitor;
pub mod options;
pub mod portfolio;
pub mod pricing;
pub mod snapshot;
pub mod spot;
pub mod store;
pub mod watchlist;

pub use broadcaster::{Broadcaster, ChannelBroadcaster, EngineEvent};
pub use cache::Cache;
pub use futures::FuturesEngine;
pub use monitor::{ExpirySettler, LiquidationMonitor};
pub use options::OptionsEngine;
pub use portfolio::{PortfolioService, PortfolioValue};
pub use snapshot::SnapshotService;
pub use spot::{crypto_symbol, SpotEngine};
pub use store::{JsonStore, StoreError};
pub use watchlist::{WatchlistData, WatchlistEntry, WatchlistService};
