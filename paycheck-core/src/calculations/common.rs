//! Rounding and percentage helpers shared by the calculators.
//!
//! All monetary values are carried as [`Decimal`]. Per-paycheck amounts are
//! rounded to the cent with [`round_half_up`] as soon as they are computed, so
//! running totals are always sums of cent values.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use paycheck_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(262.8615)), dec!(262.86));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns `pct` percent of `amount`, unrounded.
///
/// ```
/// use rust_decimal_macros::dec;
/// use paycheck_core::calculations::common::percent_of;
///
/// assert_eq!(percent_of(dec!(10), dec!(4000)), dec!(400));
/// ```
pub fn percent_of(
    pct: Decimal,
    amount: Decimal,
) -> Decimal {
    pct / Decimal::ONE_HUNDRED * amount
}

/// Expresses `part` as a percentage of `whole`. Zero when `whole` is zero.
pub fn as_percent_of(
    part: Decimal,
    whole: Decimal,
) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part / whole * Decimal::ONE_HUNDRED
}

/// Clamps negative values to zero.
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}
