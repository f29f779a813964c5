use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Bracket;

/// Paychecks per year used to annualize a single paycheck for withholding.
///
/// This is the biweekly count and is applied regardless of the job's actual
/// pay frequency.
pub const DEFAULT_ANNUALIZATION_PERIODS: u32 = 26;

fn default_annualization_periods() -> u32 {
    DEFAULT_ANNUALIZATION_PERIODS
}

/// Statutory annual contribution limits for one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionLimits {
    /// Employee elective deferral limit (traditional + Roth).
    pub employee_deferral_limit: Decimal,

    /// Total annual additions limit (employee + after-tax + employer).
    pub annual_additions_limit: Decimal,

    /// HSA limit for family coverage.
    pub hsa_family_limit: Decimal,

    /// HSA limit for self-only coverage.
    pub hsa_individual_limit: Decimal,

    /// Additional deferral allowed for catch-up eligible employees.
    pub catch_up_contribution: Decimal,
}

/// A withholding table: standard deduction plus progressive brackets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithholdingTable {
    pub standard_deduction: Decimal,
    pub brackets: Vec<Bracket>,
}

/// Everything that varies by tax year, injected into the calculators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearConfig {
    pub tax_year: i32,
    pub limits: ContributionLimits,
    pub federal: WithholdingTable,
    pub state: WithholdingTable,

    /// See [`DEFAULT_ANNUALIZATION_PERIODS`].
    #[serde(default = "default_annualization_periods")]
    pub annualization_periods: u32,
}

impl TaxYearConfig {
    /// Annualization factor as a decimal. Never zero.
    pub fn annualization_factor(&self) -> Decimal {
        Decimal::from(self.annualization_periods.max(1))
    }
}
