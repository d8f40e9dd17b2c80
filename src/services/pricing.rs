//! Options pricing.
//!
//! A simplified Black-Scholes surrogate: premium = intrinsic value plus a
//! volatility-scaled time value. Implied volatility comes from a fixed
//! per-ticker table rather than a market surface.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::types::OptionType;

/// Per-ticker implied volatility assumptions. Lookup is case-insensitive;
/// unknown tickers fall back to [`DEFAULT_IMPLIED_VOL`].
const IMPLIED_VOL_TABLE: &[(&str, f64)] = &[
    ("AAPL", 0.25),
    ("MSFT", 0.22),
    ("GOOGL", 0.28),
    ("AMZN", 0.30),
    ("JPM", 0.24),
    ("KO", 0.20),
    ("NVDA", 0.45),
    ("TSLA", 0.55),
    ("AMD", 0.50),
    ("COIN", 0.60),
    ("PLTR", 0.55),
    ("GME", 0.80),
    ("AMC", 0.75),
];

pub const DEFAULT_IMPLIED_VOL: f64 = 0.35;

/// Expiry is settled at 16:00 US Eastern, encoded as a fixed -05:00 offset.
const EXPIRY_UTC_OFFSET_SECS: i32 = -5 * 3600;
const EXPIRY_HOUR: u32 = 16;

/// Implied volatility for a ticker.
pub fn implied_vol(ticker: &str) -> f64 {
    let upper = ticker.trim().to_uppercase();
    IMPLIED_VOL_TABLE
        .iter()
        .find(|(t, _)| *t == upper)
        .map(|(_, iv)| *iv)
        .unwrap_or(DEFAULT_IMPLIED_VOL)
}

/// Intrinsic value of a contract per share.
pub fn intrinsic_value(spot: f64, strike: f64, option_type: OptionType) -> f64 {
    match option_type {
        OptionType::Call => (spot - strike).max(0.0),
        OptionType::Put => (strike - spot).max(0.0),
    }
}

/// Time value per share. Zero at or after expiry.
pub fn time_value(spot: f64, implied_vol: f64, days_to_expiry: f64) -> f64 {
    if days_to_expiry <= 0.0 {
        return 0.0;
    }
    spot * implied_vol * (days_to_expiry / 365.0).sqrt()
}

/// Per-share premium: intrinsic plus time value.
pub fn premium(
    spot: f64,
    strike: f64,
    days_to_expiry: f64,
    implied_vol: f64,
    option_type: OptionType,
) -> f64 {
    intrinsic_value(spot, strike, option_type) + time_value(spot, implied_vol, days_to_expiry)
}

/// The instant a `YYYY-MM-DD` expiry settles (16:00 at the fixed offset).
pub fn expiry_instant(expiry_date: &str) -> Option<DateTime<FixedOffset>> {
    let date = NaiveDate::parse_from_str(expiry_date, "%Y-%m-%d").ok()?;
    let offset = FixedOffset::east_opt(EXPIRY_UTC_OFFSET_SECS)?;
    date.and_hms_opt(EXPIRY_HOUR, 0, 0)?
        .and_local_timezone(offset)
        .single()
}

/// Days until expiry, signed: negative once the settlement instant passed.
/// Unparseable dates count as already expired.
pub fn days_to_expiry_signed_at(expiry_date: &str, now: DateTime<Utc>) -> f64 {
    match expiry_instant(expiry_date) {
        Some(instant) => {
            let remaining_secs = instant.signed_duration_since(now).num_seconds() as f64;
            remaining_secs / 86_400.0
        }
        None => -1.0,
    }
}

/// Days until expiry, signed, from the current time.
pub fn days_to_expiry_signed(expiry_date: &str) -> f64 {
    days_to_expiry_signed_at(expiry_date, Utc::now())
}

/// Days until expiry clamped at zero, for pricing.
pub fn days_to_expiry(expiry_date: &str) -> f64 {
    days_to_expiry_signed(expiry_date).max(0.0)
}

/// Round a money value to cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_implied_vol_table_values() {
        assert_eq!(implied_vol("AAPL"), 0.25);
        assert_eq!(implied_vol("NVDA"), 0.45);
        assert_eq!(implied_vol("GME"), 0.80);
    }

    #[test]
    fn test_implied_vol_case_insensitive() {
        assert_eq!(implied_vol("aapl"), 0.25);
        assert_eq!(implied_vol(" tsla "), 0.55);
    }

    #[test]
    fn test_implied_vol_default() {
        assert_eq!(implied_vol("ZZZZ"), 0.35);
    }

    #[test]
    fn test_intrinsic_value() {
        assert_eq!(intrinsic_value(100.0, 90.0, OptionType::Call), 10.0);
        assert_eq!(intrinsic_value(100.0, 110.0, OptionType::Call), 0.0);
        assert_eq!(intrinsic_value(100.0, 110.0, OptionType::Put), 10.0);
        assert_eq!(intrinsic_value(100.0, 90.0, OptionType::Put), 0.0);
    }

    #[test]
    fn test_time_value_zero_at_expiry() {
        assert_eq!(time_value(100.0, 0.35, 0.0), 0.0);
        assert_eq!(time_value(100.0, 0.35, -2.0), 0.0);
    }

    #[test]
    fn test_time_value_scales_with_vol() {
        let low = time_value(100.0, 0.20, 30.0);
        let high = time_value(100.0, 0.80, 30.0);
        assert!(high > low);
        assert!(low > 0.0);
    }

    #[test]
    fn test_premium_at_expiry_is_intrinsic() {
        // OTM at expiry is worthless.
        assert_eq!(premium(100.0, 110.0, 0.0, 0.35, OptionType::Call), 0.0);
        // ITM at expiry is pure intrinsic.
        assert_eq!(premium(100.0, 90.0, 0.0, 0.35, OptionType::Call), 10.0);
    }

    #[test]
    fn test_premium_before_expiry_exceeds_intrinsic() {
        let p = premium(100.0, 90.0, 30.0, 0.35, OptionType::Call);
        assert!(p > 10.0);
    }

    #[test]
    fn test_expiry_instant_offset() {
        let instant = expiry_instant("2025-06-20").unwrap();
        // 16:00 -05:00 == 21:00 UTC
        let expected = Utc.with_ymd_and_hms(2025, 6, 20, 21, 0, 0).unwrap();
        assert_eq!(instant.with_timezone(&Utc), expected);
    }

    #[test]
    fn test_days_to_expiry_signed() {
        let now = Utc.with_ymd_and_hms(2025, 6, 18, 21, 0, 0).unwrap();
        let dte = days_to_expiry_signed_at("2025-06-20", now);
        assert!((dte - 2.0).abs() < 1e-9);

        let past = days_to_expiry_signed_at("2025-06-10", now);
        assert!(past < 0.0);
    }

    #[test]
    fn test_days_to_expiry_bad_date_counts_expired() {
        assert!(days_to_expiry_signed("not-a-date") < 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.006), 1.01);
        assert_eq!(round2(12.3449), 12.34);
    }
}
