use thiserror::Error;

use crate::services::store::StoreError;

/// Engine error types.
///
/// Every public engine operation returns `Result<T, EngineError>`; callers at
/// the RPC boundary render the `Display` form as the failure message.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Insufficient funds: need ${needed:.2}, have ${available:.2}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("Insufficient holdings of {ticker}: requested {requested}, held {held}")]
    InsufficientHoldings {
        ticker: String,
        requested: f64,
        held: f64,
    },

    #[error("Quote source error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
