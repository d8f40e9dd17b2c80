use std::env;
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the persisted account files.
    pub data_dir: PathBuf,
    /// Quote cache TTL in seconds.
    pub quote_ttl_secs: u64,
    /// Liquidation monitor cadence in seconds.
    pub liquidation_interval_secs: u64,
    /// Options expiry settler cadence in seconds.
    pub settle_interval_secs: u64,
    /// Binance API key (optional, public endpoints work without).
    pub binance_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let data_dir = env::var("OPENCLAW_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        Self {
            data_dir,
            quote_ttl_secs: env::var("QUOTE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            liquidation_interval_secs: env::var("LIQUIDATION_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            settle_interval_secs: env::var("SETTLE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3_600),
            binance_api_key: env::var("BINANCE_API_KEY").ok(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    match env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".openclaw"),
        Err(_) => PathBuf::from(".openclaw"),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
