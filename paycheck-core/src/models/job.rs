use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ContributionInput;

/// A job as seen by the allocation optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub name: String,
    pub gross_per_paycheck: Decimal,
    pub paycheck_count: u32,

    /// Maximum employee HSA contribution per paycheck for this job.
    pub hsa_allowed: Decimal,

    /// Traditional percentage needed to capture the full employer match.
    pub match_threshold_pct: Decimal,

    /// Highest traditional percentage the plan permits.
    pub max_traditional_pct: Decimal,

    pub allow_roth: bool,
    pub allow_after_tax: bool,

    /// Employer reconciles match shortfalls at year-end.
    pub true_up: bool,

    /// Roth percentage to use when the plan allows Roth.
    pub preferred_roth_pct: Decimal,

    /// After-tax percentage to use when the plan allows after-tax.
    pub preferred_after_tax_pct: Decimal,
}

impl JobDescriptor {
    /// A descriptor with no HSA room, no match threshold, a 100% traditional
    /// ceiling and every optional feature disabled.
    pub fn new(
        name: impl Into<String>,
        gross_per_paycheck: Decimal,
        paycheck_count: u32,
    ) -> Self {
        Self {
            name: name.into(),
            gross_per_paycheck,
            paycheck_count,
            hsa_allowed: Decimal::ZERO,
            match_threshold_pct: Decimal::ZERO,
            max_traditional_pct: Decimal::ONE_HUNDRED,
            allow_roth: false,
            allow_after_tax: false,
            true_up: false,
            preferred_roth_pct: Decimal::ZERO,
            preferred_after_tax_pct: Decimal::ZERO,
        }
    }

    /// Gross pay over every paycheck of the schedule.
    pub fn schedule_gross(&self) -> Decimal {
        self.gross_per_paycheck * Decimal::from(self.paycheck_count)
    }
}

/// The optimizer's proposal for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizedJob {
    pub job_name: String,
    pub contribution_input: ContributionInput,
    pub notes: Vec<String>,
}
