//! Projection and optimization calculators.
//!
//! Each calculator borrows the tax-year data it needs and returns plain
//! result records:
//!
//! - [`tax_tables`]: progressive bracket evaluation and the reference tables
//! - [`schedule`]: paycheck dates for one job in one tax year
//! - [`contribution_plan`]: per-paycheck contributions, withholding and YTD totals
//! - [`limit_checker`]: annual totals against statutory limits
//! - [`optimizer`]: greedy allocation of HSA and 401(k) room across jobs

pub mod common;
pub mod contribution_plan;
pub mod limit_checker;
pub mod optimizer;
pub mod schedule;
pub mod tax_tables;

pub use contribution_plan::{ContributionPlan, ContributionPlanInput};
pub use limit_checker::{ContributionTotals, HsaCoverage, LimitChecker};
pub use optimizer::Optimizer;
pub use schedule::{PayFrequency, PaycheckDates, PaycheckSchedule, ScheduleError};
pub use tax_tables::{
    REFERENCE_TAX_YEAR, federal_table, progressive_tax, reference_config, reference_limits,
    state_table,
};
