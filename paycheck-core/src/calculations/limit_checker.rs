//! Statutory limit checks over a finished year of paychecks.
//!
//! Three totals are compared against the tax year's limits:
//!
//! | Total | Made up of | Limit |
//! |-------|-----------|-------|
//! | Employee 401(k) | traditional + Roth | employee deferral limit (+ catch-up) |
//! | HSA | employee HSA + employer HSA | family or individual HSA limit |
//! | Annual additions | traditional + Roth + after-tax + match | annual additions limit (+ catch-up) |
//!
//! Balances contributed before the first paycheck ([`StartingYtd`]) are added
//! to each total. Breaches are reported as warnings; nothing is corrected.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calculations::common::round_half_up;
use crate::models::{ContributionLimits, LimitResult, PaycheckResult, StartingYtd};

/// HSA coverage tier, which selects the applicable HSA limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HsaCoverage {
    Individual,
    #[default]
    Family,
}

impl HsaCoverage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Family => "family",
        }
    }

    fn limit(
        self,
        limits: &ContributionLimits,
    ) -> Decimal {
        match self {
            Self::Individual => limits.hsa_individual_limit,
            Self::Family => limits.hsa_family_limit,
        }
    }
}

/// Aggregated contribution totals for a set of paychecks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionTotals {
    pub employee_401k: Decimal,
    pub hsa: Decimal,
    pub annual_additions: Decimal,
}

impl ContributionTotals {
    pub fn from_paychecks<'p>(paychecks: impl IntoIterator<Item = &'p PaycheckResult>) -> Self {
        Self::default().with_paychecks(paychecks)
    }

    /// Adds each paycheck's contributions to these totals.
    pub fn with_paychecks<'p>(
        self,
        paychecks: impl IntoIterator<Item = &'p PaycheckResult>,
    ) -> Self {
        paychecks
            .into_iter()
            .fold(self, |totals, p| Self {
                employee_401k: totals.employee_401k + p.elective_deferrals(),
                hsa: totals.hsa + p.total_hsa(),
                annual_additions: totals.annual_additions + p.annual_additions(),
            })
    }
}

impl From<StartingYtd> for ContributionTotals {
    fn from(start: StartingYtd) -> Self {
        Self {
            employee_401k: start.elective_deferrals(),
            hsa: start.hsa,
            annual_additions: start.annual_additions(),
        }
    }
}

/// Checks a year of paychecks against [`ContributionLimits`].
///
/// # Example
///
/// ```
/// use paycheck_core::calculations::{LimitChecker, reference_limits};
///
/// let limits = reference_limits();
/// let result = LimitChecker::new(&[], &limits).validate();
///
/// assert!(result.within_limits);
/// assert!(result.warnings.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct LimitChecker<'a> {
    paychecks: &'a [PaycheckResult],
    limits: &'a ContributionLimits,
    hsa_coverage: HsaCoverage,
    catch_up_eligible: bool,
    starting_ytd: StartingYtd,
}

impl<'a> LimitChecker<'a> {
    pub fn new(
        paychecks: &'a [PaycheckResult],
        limits: &'a ContributionLimits,
    ) -> Self {
        Self {
            paychecks,
            limits,
            hsa_coverage: HsaCoverage::default(),
            catch_up_eligible: false,
            starting_ytd: StartingYtd::default(),
        }
    }

    pub fn with_hsa_coverage(
        mut self,
        hsa_coverage: HsaCoverage,
    ) -> Self {
        self.hsa_coverage = hsa_coverage;
        self
    }

    /// Catch-up eligible employees may defer `catch_up_contribution` more.
    pub fn with_catch_up(
        mut self,
        catch_up_eligible: bool,
    ) -> Self {
        self.catch_up_eligible = catch_up_eligible;
        self
    }

    /// Balances contributed before the first paycheck in `paychecks`.
    pub fn with_starting_ytd(
        mut self,
        starting_ytd: StartingYtd,
    ) -> Self {
        self.starting_ytd = starting_ytd;
        self
    }

    pub fn totals(&self) -> ContributionTotals {
        ContributionTotals::from(self.starting_ytd).with_paychecks(self.paychecks)
    }

    /// Compares the totals against each limit and collects one warning per
    /// breach, in the order employee 401(k), HSA, annual additions.
    pub fn validate(&self) -> LimitResult {
        let totals = self.totals();
        let catch_up = if self.catch_up_eligible {
            self.limits.catch_up_contribution
        } else {
            Decimal::ZERO
        };

        let checks = [
            (
                "Employee 401(k) limit".to_string(),
                totals.employee_401k,
                self.limits.employee_deferral_limit + catch_up,
            ),
            (
                format!("HSA {} limit", self.hsa_coverage.as_str()),
                totals.hsa,
                self.hsa_coverage.limit(self.limits),
            ),
            (
                "Annual additions limit".to_string(),
                totals.annual_additions,
                self.limits.annual_additions_limit + catch_up,
            ),
        ];

        let warnings = checks
            .into_iter()
            .filter_map(|(label, total, limit)| Self::breach(&label, total, limit))
            .collect();

        LimitResult::from_warnings(warnings)
    }

    fn breach(
        label: &str,
        total: Decimal,
        limit: Decimal,
    ) -> Option<String> {
        if total <= limit {
            return None;
        }

        let overage = round_half_up(total - limit);
        warn!(limit = label, %total, %overage, "contribution limit exceeded");
        Some(format!("{label} exceeded by ${overage:.2}"))
    }
}
