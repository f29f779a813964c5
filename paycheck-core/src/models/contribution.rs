use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-paycheck contribution elections, each a percentage of gross pay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionInput {
    #[serde(default)]
    pub traditional_pct: Decimal,
    #[serde(default)]
    pub roth_pct: Decimal,
    #[serde(default)]
    pub after_tax_pct: Decimal,
    #[serde(default)]
    pub hsa_pct: Decimal,
}

impl ContributionInput {
    pub fn new(
        traditional_pct: Decimal,
        roth_pct: Decimal,
        after_tax_pct: Decimal,
        hsa_pct: Decimal,
    ) -> Self {
        Self {
            traditional_pct,
            roth_pct,
            after_tax_pct,
            hsa_pct,
        }
    }

    /// Traditional + Roth + after-tax percentage.
    pub fn retirement_pct(&self) -> Decimal {
        self.traditional_pct + self.roth_pct + self.after_tax_pct
    }

    /// All four elections combined.
    pub fn total_pct(&self) -> Decimal {
        self.retirement_pct() + self.hsa_pct
    }
}

/// Year-to-date balances already on the books before the first projected
/// paycheck, e.g. when a projection starts mid-year.
///
/// `hsa` is employee and employer HSA combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingYtd {
    #[serde(default)]
    pub traditional: Decimal,
    #[serde(default)]
    pub roth: Decimal,
    #[serde(default)]
    pub after_tax: Decimal,
    #[serde(default)]
    pub hsa: Decimal,
    #[serde(default)]
    pub employer_match: Decimal,
}

impl StartingYtd {
    /// Traditional + Roth, the amounts subject to the deferral limit.
    pub fn elective_deferrals(&self) -> Decimal {
        self.traditional + self.roth
    }

    /// Every employee 401(k) dollar, after-tax included.
    pub fn employee_401k(&self) -> Decimal {
        self.elective_deferrals() + self.after_tax
    }

    /// Employee 401(k) plus employer match.
    pub fn annual_additions(&self) -> Decimal {
        self.employee_401k() + self.employer_match
    }
}

impl Add for StartingYtd {
    type Output = Self;

    fn add(
        self,
        other: Self,
    ) -> Self {
        Self {
            traditional: self.traditional + other.traditional,
            roth: self.roth + other.roth,
            after_tax: self.after_tax + other.after_tax,
            hsa: self.hsa + other.hsa,
            employer_match: self.employer_match + other.employer_match,
        }
    }
}

impl Sum for StartingYtd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
