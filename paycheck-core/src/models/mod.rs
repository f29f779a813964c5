mod contribution;
mod job;
mod limit_result;
mod paycheck_result;
mod tax_bracket;
mod tax_year_config;

pub use contribution::{ContributionInput, StartingYtd};
pub use job::{JobDescriptor, OptimizedJob};
pub use limit_result::LimitResult;
pub use paycheck_result::PaycheckResult;
pub use tax_bracket::Bracket;
pub use tax_year_config::{
    ContributionLimits, DEFAULT_ANNUALIZATION_PERIODS, TaxYearConfig, WithholdingTable,
};
