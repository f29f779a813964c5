//! Per-paycheck contribution, match and withholding projection.
//!
//! For every paycheck date the plan computes, in order:
//!
//! | Step | Value |
//! |------|-------|
//! | 1    | Employee traditional, Roth, after-tax and HSA amounts (percent of gross) |
//! | 2    | Employer match: `min(traditional + roth, gross × cap%) × match rate` |
//! | 3    | Running YTD totals for 401(k), HSA and match |
//! | 4    | Federal and state withholding on `gross - traditional - hsa`, annualized |
//! | 5    | Net cash: gross less every employee contribution and withholding |
//!
//! Every amount is rounded to the cent when computed.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use paycheck_core::ContributionInput;
//! use paycheck_core::calculations::{ContributionPlan, ContributionPlanInput, reference_config};
//!
//! let config = reference_config();
//! let input = ContributionPlanInput::new(
//!     dec!(4000),
//!     ContributionInput::new(dec!(10), dec!(5), dec!(0), dec!(2)),
//!     dec!(0.5),
//!     dec!(6),
//! )
//! .with_employer_hsa(dec!(100));
//!
//! let plan = ContributionPlan::new(input, &config);
//! let dates = [NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()];
//! let paychecks = plan.process_paychecks(&dates);
//!
//! assert_eq!(paychecks[0].employee_traditional, dec!(400));
//! assert_eq!(paychecks[0].employer_match, dec!(120));
//! assert_eq!(paychecks[0].ytd_hsa, dec!(180));
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{percent_of, round_half_up};
use crate::models::{ContributionInput, PaycheckResult, StartingYtd, TaxYearConfig};

/// Compensation and plan terms for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionPlanInput {
    pub gross_per_paycheck: Decimal,
    pub contribution_input: ContributionInput,

    /// Employer match as a fraction of matchable contributions (e.g. `0.5`).
    #[serde(default)]
    pub employer_match_rate: Decimal,

    /// Percentage of each paycheck's gross eligible for match (e.g. `6`).
    #[serde(default)]
    pub employer_match_cap_pct: Decimal,

    #[serde(default)]
    pub employer_hsa_per_paycheck: Decimal,

    /// Balances already accumulated this year before the first paycheck.
    #[serde(default)]
    pub starting_ytd: StartingYtd,
}

impl ContributionPlanInput {
    pub fn new(
        gross_per_paycheck: Decimal,
        contribution_input: ContributionInput,
        employer_match_rate: Decimal,
        employer_match_cap_pct: Decimal,
    ) -> Self {
        Self {
            gross_per_paycheck,
            contribution_input,
            employer_match_rate,
            employer_match_cap_pct,
            employer_hsa_per_paycheck: Decimal::ZERO,
            starting_ytd: StartingYtd::default(),
        }
    }

    pub fn with_employer_hsa(
        mut self,
        employer_hsa_per_paycheck: Decimal,
    ) -> Self {
        self.employer_hsa_per_paycheck = employer_hsa_per_paycheck;
        self
    }

    pub fn with_starting_ytd(
        mut self,
        starting_ytd: StartingYtd,
    ) -> Self {
        self.starting_ytd = starting_ytd;
        self
    }

    /// Same compensation terms with different elections.
    pub fn with_contributions(
        &self,
        contribution_input: ContributionInput,
    ) -> Self {
        Self {
            contribution_input,
            ..self.clone()
        }
    }
}

/// Employee deductions for one paycheck, rounded to the cent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EmployeeContributions {
    traditional: Decimal,
    roth: Decimal,
    after_tax: Decimal,
    hsa: Decimal,
}

impl EmployeeContributions {
    fn retirement_total(&self) -> Decimal {
        self.traditional + self.roth + self.after_tax
    }

    fn total(&self) -> Decimal {
        self.retirement_total() + self.hsa
    }
}

/// Running totals threaded through one call to `process_paychecks`.
#[derive(Debug, Clone, Copy)]
struct YtdTotals {
    employee_401k: Decimal,
    hsa: Decimal,
    employer_match: Decimal,
}

impl From<StartingYtd> for YtdTotals {
    fn from(start: StartingYtd) -> Self {
        Self {
            employee_401k: start.employee_401k(),
            hsa: start.hsa,
            employer_match: start.employer_match,
        }
    }
}

/// Projects paychecks for one job under one tax-year configuration.
#[derive(Debug, Clone)]
pub struct ContributionPlan<'a> {
    input: ContributionPlanInput,
    config: &'a TaxYearConfig,
}

impl<'a> ContributionPlan<'a> {
    pub fn new(
        input: ContributionPlanInput,
        config: &'a TaxYearConfig,
    ) -> Self {
        Self { input, config }
    }

    pub fn input(&self) -> &ContributionPlanInput {
        &self.input
    }

    /// Produces one [`PaycheckResult`] per date, in the order given.
    ///
    /// Accumulators start from the configured starting YTD balances on every
    /// call, so repeated calls with the same dates return identical results.
    pub fn process_paychecks(
        &self,
        dates: &[NaiveDate],
    ) -> Vec<PaycheckResult> {
        let elections = &self.input.contribution_input;
        if elections.total_pct() > Decimal::ONE_HUNDRED {
            warn!(
                total_pct = %elections.total_pct(),
                "contribution percentages exceed 100% of gross; net cash will be negative"
            );
        }

        let mut ytd = YtdTotals::from(self.input.starting_ytd);
        let results: Vec<PaycheckResult> = dates
            .iter()
            .map(|&date| self.process_paycheck(date, &mut ytd))
            .collect();

        if let Some(first_negative) = results.iter().find(|p| p.net_cash < Decimal::ZERO) {
            warn!(
                date = %first_negative.date,
                net_cash = %first_negative.net_cash,
                "projected net cash is negative"
            );
        }

        debug!(
            paychecks = results.len(),
            ytd_employee_401k = %ytd.employee_401k,
            ytd_hsa = %ytd.hsa,
            ytd_match = %ytd.employer_match,
            "projected paychecks"
        );

        results
    }

    fn process_paycheck(
        &self,
        date: NaiveDate,
        ytd: &mut YtdTotals,
    ) -> PaycheckResult {
        let gross = self.input.gross_per_paycheck;
        let employee = self.employee_contributions(gross);
        let employer_match = self.employer_match(gross, &employee);
        let employer_hsa = round_half_up(self.input.employer_hsa_per_paycheck);

        ytd.employee_401k += employee.retirement_total();
        ytd.hsa += employee.hsa + employer_hsa;
        ytd.employer_match += employer_match;

        let taxable_wages = self.taxable_wages(gross, &employee);
        let federal_tax = self.withholding(taxable_wages, |annual| {
            self.config.federal.annual_tax(annual)
        });
        let state_tax = self.withholding(taxable_wages, |annual| {
            self.config.state.annual_tax(annual)
        });

        let net_cash = gross - employee.total() - federal_tax - state_tax;

        PaycheckResult {
            date,
            gross,
            employee_traditional: employee.traditional,
            employee_roth: employee.roth,
            employee_after_tax: employee.after_tax,
            employee_hsa: employee.hsa,
            employer_match,
            employer_hsa,
            federal_tax,
            state_tax,
            net_cash,
            ytd_employee_401k: ytd.employee_401k,
            ytd_hsa: ytd.hsa,
            ytd_match: ytd.employer_match,
        }
    }

    /// Step 1: employee elections as cent amounts.
    fn employee_contributions(
        &self,
        gross: Decimal,
    ) -> EmployeeContributions {
        let elections = &self.input.contribution_input;
        EmployeeContributions {
            traditional: round_half_up(percent_of(elections.traditional_pct, gross)),
            roth: round_half_up(percent_of(elections.roth_pct, gross)),
            after_tax: round_half_up(percent_of(elections.after_tax_pct, gross)),
            hsa: round_half_up(percent_of(elections.hsa_pct, gross)),
        }
    }

    /// Step 2: match on traditional + Roth only, capped at a share of this
    /// paycheck's gross. No cross-paycheck true-up.
    fn employer_match(
        &self,
        gross: Decimal,
        employee: &EmployeeContributions,
    ) -> Decimal {
        let cap = percent_of(self.input.employer_match_cap_pct, gross);
        let matchable = (employee.traditional + employee.roth).min(cap);
        round_half_up(matchable * self.input.employer_match_rate)
    }

    /// Step 4: pretax and HSA reduce taxable wages; Roth and after-tax do not.
    fn taxable_wages(
        &self,
        gross: Decimal,
        employee: &EmployeeContributions,
    ) -> Decimal {
        gross - employee.traditional - employee.hsa
    }

    /// Annualizes `taxable_wages`, applies `annual_tax`, and spreads the
    /// result back over the same number of periods.
    fn withholding(
        &self,
        taxable_wages: Decimal,
        annual_tax: impl Fn(Decimal) -> Decimal,
    ) -> Decimal {
        let periods = self.config.annualization_factor();
        round_half_up(annual_tax(taxable_wages * periods) / periods)
    }
}
