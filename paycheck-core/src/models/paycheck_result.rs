use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The projected breakdown of one paycheck.
///
/// The `ytd_*` fields are running totals through and including this paycheck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaycheckResult {
    pub date: NaiveDate,
    pub gross: Decimal,

    // Employee contributions
    pub employee_traditional: Decimal,
    pub employee_roth: Decimal,
    pub employee_after_tax: Decimal,
    pub employee_hsa: Decimal,

    // Employer contributions (informational, never deducted from pay)
    pub employer_match: Decimal,
    pub employer_hsa: Decimal,

    // Withholding
    pub federal_tax: Decimal,
    pub state_tax: Decimal,

    /// Take-home pay. May be negative when elections exceed gross.
    pub net_cash: Decimal,

    // Running totals
    pub ytd_employee_401k: Decimal,
    pub ytd_hsa: Decimal,
    pub ytd_match: Decimal,
}

impl PaycheckResult {
    /// Traditional + Roth, the amount that counts toward the deferral limit.
    pub fn elective_deferrals(&self) -> Decimal {
        self.employee_traditional + self.employee_roth
    }

    /// Employee and employer HSA funding for this paycheck.
    pub fn total_hsa(&self) -> Decimal {
        self.employee_hsa + self.employer_hsa
    }

    /// Everything that counts toward the annual additions limit.
    pub fn annual_additions(&self) -> Decimal {
        self.elective_deferrals() + self.employee_after_tax + self.employer_match
    }
}
