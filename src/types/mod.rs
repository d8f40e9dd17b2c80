pub mod asset;
pub mod events;
pub mod futures;
pub mod options;
pub mod portfolio;
pub mod quote;
pub mod snapshot;

pub use asset::{normalize_ticker, AssetClass, AssetType, MarginMode, OptionType, PositionSide};
pub use events::{
    LiquidationEvent, OptionExpiryEvent, EVENT_FUTURES_LIQUIDATION, EVENT_OPTIONS_EXPIRED,
};
pub use futures::{
    FuturesAccount, FuturesData, FuturesPosition, FuturesTransaction, FuturesTxType,
    DEFAULT_LEVERAGE, MAX_LEVERAGE, MIN_LEVERAGE,
};
pub use options::{
    ChainExpiry, ChainStrike, OptionContract, OptionPosition, OptionQuote, OptionTransaction,
    OptionTxType, OptionsData, CONTRACT_MULTIPLIER,
};
pub use portfolio::{
    DailySnapshot, Holding, HoldingMeta, Portfolio, SpotTransaction, SpotTxType,
    DAILY_SNAPSHOT_CAP, DEFAULT_STARTING_CASH,
};
pub use quote::Quote;
pub use snapshot::{DayChange, PortfolioSnapshot, SpotHoldingView, UnifiedPosition};
