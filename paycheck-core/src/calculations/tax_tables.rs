//! Progressive tax evaluation and the reference withholding tables.
//!
//! [`progressive_tax`] applies marginal brackets exactly: each slice of income
//! is taxed at the rate of the bracket it falls in. Standard deductions are
//! not applied here; [`WithholdingTable::annual_tax`] subtracts the table's
//! deduction before evaluating the brackets.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use paycheck_core::Bracket;
//! use paycheck_core::calculations::progressive_tax;
//!
//! let brackets = vec![
//!     Bracket::new(dec!(10000), dec!(0.10)),
//!     Bracket::unbounded(dec!(0.20)),
//! ];
//!
//! // 10,000 at 10% plus 5,000 at 20%
//! assert_eq!(progressive_tax(dec!(15000), &brackets), dec!(2000));
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::calculations::common::non_negative;
use crate::models::{Bracket, ContributionLimits, TaxYearConfig, WithholdingTable};

/// Tax year the built-in tables describe.
pub const REFERENCE_TAX_YEAR: i32 = 2026;

/// Computes the tax on `amount` under progressive `brackets`.
///
/// Brackets must be in ascending order of upper bound. Income beyond the last
/// bounded bracket is untaxed unless the table ends with an unbounded bracket.
/// Non-positive amounts produce zero tax. The result is not rounded.
pub fn progressive_tax(
    amount: Decimal,
    brackets: &[Bracket],
) -> Decimal {
    let mut tax = Decimal::ZERO;
    let mut remaining = amount;
    let mut lower_bound = Decimal::ZERO;

    for bracket in brackets {
        if remaining <= Decimal::ZERO {
            break;
        }

        let taxed = match bracket.upper_bound {
            Some(upper) => remaining.min(non_negative(upper - lower_bound)),
            None => remaining,
        };

        tax += taxed * bracket.rate;
        remaining -= taxed;

        if let Some(upper) = bracket.upper_bound {
            lower_bound = upper;
        }
    }

    tax
}

impl WithholdingTable {
    /// Annual tax on `annual_wages` after the standard deduction.
    pub fn annual_tax(
        &self,
        annual_wages: Decimal,
    ) -> Decimal {
        let taxable = non_negative(annual_wages - self.standard_deduction);
        progressive_tax(taxable, &self.brackets)
    }
}

/// Reference federal table (married filing jointly).
pub fn federal_table() -> WithholdingTable {
    WithholdingTable {
        standard_deduction: dec!(30700),
        brackets: vec![
            Bracket::new(dec!(23200), dec!(0.10)),
            Bracket::new(dec!(94300), dec!(0.12)),
            Bracket::new(dec!(201050), dec!(0.22)),
            Bracket::new(dec!(383900), dec!(0.24)),
            Bracket::new(dec!(487450), dec!(0.32)),
            Bracket::new(dec!(731200), dec!(0.35)),
            Bracket::unbounded(dec!(0.37)),
        ],
    }
}

/// Reference state table.
pub fn state_table() -> WithholdingTable {
    WithholdingTable {
        standard_deduction: dec!(10404),
        brackets: vec![
            Bracket::new(dec!(20659), dec!(0.01)),
            Bracket::new(dec!(48435), dec!(0.02)),
            Bracket::new(dec!(76215), dec!(0.04)),
            Bracket::new(dec!(105387), dec!(0.06)),
            Bracket::new(dec!(133667), dec!(0.08)),
            Bracket::new(dec!(679015), dec!(0.093)),
            Bracket::unbounded(dec!(0.103)),
        ],
    }
}

/// Reference statutory limits.
pub fn reference_limits() -> ContributionLimits {
    ContributionLimits {
        employee_deferral_limit: dec!(23000),
        annual_additions_limit: dec!(66000),
        hsa_family_limit: dec!(8300),
        hsa_individual_limit: dec!(4150),
        catch_up_contribution: dec!(7500),
    }
}

/// The built-in configuration for [`REFERENCE_TAX_YEAR`].
///
/// Callers with year-specific data should load their own [`TaxYearConfig`];
/// this is the fallback when none is supplied.
pub fn reference_config() -> TaxYearConfig {
    TaxYearConfig {
        tax_year: REFERENCE_TAX_YEAR,
        limits: reference_limits(),
        federal: federal_table(),
        state: state_table(),
        annualization_periods: crate::models::DEFAULT_ANNUALIZATION_PERIODS,
    }
}
