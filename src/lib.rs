//! Clawtrade - simulated multi-asset paper trading engine
//!
//! One shared cash ledger backs four product lines: spot stocks, spot
//! crypto, leveraged crypto perpetuals, and long stock options. Quotes come
//! from pluggable providers; fills are simulated at the current quote and
//! persisted as JSON aggregates. Background monitors handle forced
//! liquidation and options expiry.

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

pub use config::Config;
pub use error::{EngineError, Result};
pub use types::*;
