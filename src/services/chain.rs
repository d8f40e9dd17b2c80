//! Options chain generation.
//!
//! Builds the expiry date set (weekly and monthly Fridays) and a strike grid
//! centered on the underlying price, then prices every strike with the
//! pricing module.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};

use crate::services::pricing;
use crate::types::{ChainExpiry, ChainStrike, OptionType};

/// Number of strikes on each side of the centered strike.
const STRIKE_SPAN: i64 = 10;

/// Upcoming expiry dates as `YYYY-MM-DD`, deduplicated and ascending:
/// this week's Friday (unless less than a day away), next Friday, this
/// month's third Friday when still in the future, and next month's third
/// Friday.
pub fn expiry_dates(today: NaiveDate) -> Vec<String> {
    let mut dates: Vec<NaiveDate> = Vec::new();

    let days_until_friday =
        (Weekday::Fri.num_days_from_monday() as i64 - today.weekday().num_days_from_monday() as i64)
            .rem_euclid(7);
    let this_friday = today + Duration::days(days_until_friday);
    if days_until_friday >= 1 {
        dates.push(this_friday);
    }
    dates.push(this_friday + Duration::days(7));

    if let Some(third) = third_friday(today.year(), today.month()) {
        if third > today {
            dates.push(third);
        }
    }

    let (next_year, next_month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    if let Some(third) = third_friday(next_year, next_month) {
        dates.push(third);
    }

    dates.sort();
    dates.dedup();
    dates
        .into_iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect()
}

/// Third Friday of the given month.
fn third_friday(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let days_until_friday = (Weekday::Fri.num_days_from_monday() as i64
        - first.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    Some(first + Duration::days(days_until_friday + 14))
}

/// Strike step size for a price band.
pub fn strike_step(price: f64) -> f64 {
    if price < 50.0 {
        1.0
    } else if price < 200.0 {
        5.0
    } else if price < 500.0 {
        10.0
    } else {
        25.0
    }
}

/// Strike grid centered on the price: 21 strikes at step offsets, with
/// non-positive strikes dropped.
pub fn strike_grid(price: f64) -> Vec<f64> {
    let step = strike_step(price);
    let center = (price / step).round() * step;
    (-STRIKE_SPAN..=STRIKE_SPAN)
        .map(|i| center + i as f64 * step)
        .filter(|s| *s > 0.0)
        .collect()
}

/// Generate a full chain for an underlying at the given price and implied
/// volatility, relative to `now`.
pub fn generate_chain_at(price: f64, implied_vol: f64, now: DateTime<Utc>) -> Vec<ChainExpiry> {
    expiry_dates(now.date_naive())
        .into_iter()
        .map(|expiry_date| {
            let dte = pricing::days_to_expiry_signed_at(&expiry_date, now).max(0.0);
            let strikes = strike_grid(price)
                .into_iter()
                .map(|strike| {
                    let call = pricing::premium(price, strike, dte, implied_vol, OptionType::Call);
                    let put = pricing::premium(price, strike, dte, implied_vol, OptionType::Put);
                    ChainStrike {
                        strike,
                        call_premium: pricing::round2(call),
                        put_premium: pricing::round2(put),
                        call_premium_per_contract: pricing::round2(call * 100.0),
                        put_premium_per_contract: pricing::round2(put * 100.0),
                    }
                })
                .collect();
            ChainExpiry {
                expiry_date,
                days_to_expiry: (dte * 10.0).round() / 10.0,
                strikes,
            }
        })
        .collect()
}

/// Generate a chain relative to the current time.
pub fn generate_chain(price: f64, implied_vol: f64) -> Vec<ChainExpiry> {
    generate_chain_at(price, implied_vol, Utc::now())
}
