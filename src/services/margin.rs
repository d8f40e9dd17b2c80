//! Margin calculation for isolated-margin perpetual positions.
//!
//! Initial margin is notional divided by leverage. The maintenance margin
//! rate is tiered on notional; the liquidation price follows the isolated
//! closed form for each side.

use crate::types::PositionSide;

/// Maintenance margin rate tiers, keyed by notional upper bound.
const MM_RATE_TIERS: &[(f64, f64)] = &[
    (50_000.0, 0.004),
    (250_000.0, 0.005),
    (1_000_000.0, 0.01),
];

/// Rate applied above the last tier bound.
const MM_RATE_TOP: f64 = 0.025;

/// Initial margin required to open a position.
pub fn initial_margin(quantity: f64, entry_price: f64, leverage: u32) -> f64 {
    quantity * entry_price / leverage as f64
}

/// Tiered maintenance margin rate for a notional value.
pub fn maintenance_margin_rate(notional: f64) -> f64 {
    for (bound, rate) in MM_RATE_TIERS {
        if notional < *bound {
            return *rate;
        }
    }
    MM_RATE_TOP
}

/// Maintenance margin at the current mark.
pub fn maintenance_margin(quantity: f64, mark_price: f64, mm_rate: f64) -> f64 {
    quantity * mark_price * mm_rate
}

/// Mark price at which the position is force-closed.
pub fn liquidation_price(side: PositionSide, entry_price: f64, leverage: u32, mm_rate: f64) -> f64 {
    let lev = leverage as f64;
    match side {
        PositionSide::Long => entry_price * (1.0 - 1.0 / lev + mm_rate),
        PositionSide::Short => entry_price * (1.0 + 1.0 / lev - mm_rate),
    }
}

/// Unrealized PnL of a position at the given mark.
pub fn unrealized_pnl(side: PositionSide, quantity: f64, entry_price: f64, mark_price: f64) -> f64 {
    match side {
        PositionSide::Long => (mark_price - entry_price) * quantity,
        PositionSide::Short => (entry_price - mark_price) * quantity,
    }
}

/// Return on equity, as a percentage of initial margin.
pub fn roe(pnl: f64, initial_margin: f64) -> f64 {
    if initial_margin > 0.0 {
        pnl / initial_margin * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_initial_margin() {
        assert!((initial_margin(1.0, 60_000.0, 10) - 6_000.0).abs() < EPS);
        assert!((initial_margin(2.0, 3_000.0, 20) - 300.0).abs() < EPS);
    }

    #[test]
    fn test_maintenance_margin_rate_tiers() {
        assert_eq!(maintenance_margin_rate(0.0), 0.004);
        assert_eq!(maintenance_margin_rate(49_999.99), 0.004);
        assert_eq!(maintenance_margin_rate(50_000.0), 0.005);
        assert_eq!(maintenance_margin_rate(249_999.0), 0.005);
        assert_eq!(maintenance_margin_rate(250_000.0), 0.01);
        assert_eq!(maintenance_margin_rate(999_999.0), 0.01);
        assert_eq!(maintenance_margin_rate(1_000_000.0), 0.025);
        assert_eq!(maintenance_margin_rate(5_000_000.0), 0.025);
    }

    #[test]
    fn test_liquidation_price_long() {
        // 1 BTC at 60k, 10x: notional 60k -> mm rate 0.005
        let liq = liquidation_price(PositionSide::Long, 60_000.0, 10, 0.005);
        assert!((liq - 54_300.0).abs() < 1e-6);
    }

    #[test]
    fn test_liquidation_price_short() {
        let liq = liquidation_price(PositionSide::Short, 60_000.0, 10, 0.005);
        assert!((liq - 65_700.0).abs() < 1e-6);
    }

    #[test]
    fn test_liquidation_price_brackets_entry() {
        let long = liquidation_price(PositionSide::Long, 100.0, 5, 0.004);
        let short = liquidation_price(PositionSide::Short, 100.0, 5, 0.004);
        assert!(long < 100.0);
        assert!(short > 100.0);
    }

    #[test]
    fn test_unrealized_pnl_long() {
        assert!((unrealized_pnl(PositionSide::Long, 1.0, 60_000.0, 65_000.0) - 5_000.0).abs() < EPS);
        assert!((unrealized_pnl(PositionSide::Long, 1.0, 60_000.0, 55_000.0) + 5_000.0).abs() < EPS);
    }

    #[test]
    fn test_unrealized_pnl_short() {
        assert!(
            (unrealized_pnl(PositionSide::Short, 2.0, 3_000.0, 2_500.0) - 1_000.0).abs() < EPS
        );
    }

    #[test]
    fn test_unrealized_pnl_round_trip_is_zero() {
        assert_eq!(unrealized_pnl(PositionSide::Long, 1.5, 42_000.0, 42_000.0), 0.0);
        assert_eq!(unrealized_pnl(PositionSide::Short, 1.5, 42_000.0, 42_000.0), 0.0);
    }

    #[test]
    fn test_roe() {
        assert!((roe(500.0, 1_000.0) - 50.0).abs() < EPS);
        assert!((roe(-250.0, 1_000.0) + 25.0).abs() < EPS);
        assert_eq!(roe(500.0, 0.0), 0.0);
    }
}
