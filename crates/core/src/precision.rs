//! Precision of stored quantities and amounts.
//!
//! Every quantity and money column is `NUMERIC(19, 4)`. Inputs with more
//! fractional digits would be rounded silently on write, so they are rejected
//! up front; computed totals are rounded the way the database stores them.

use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits kept by quantity and money columns.
pub const SCALE: u32 = 4;

/// Integer digits kept by quantity and money columns.
pub const INTEGER_DIGITS: u32 = 15;

/// Returns true when `value` is stored exactly.
#[must_use]
pub fn fits(value: Decimal) -> bool {
    let limit = Decimal::from(10_i64.pow(INTEGER_DIGITS));
    value.normalize().scale() <= SCALE && value.abs() < limit
}

/// Rounds a computed amount half away from zero to [`SCALE`] digits.
#[must_use]
pub fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
}
