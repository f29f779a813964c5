pub mod calculations;
pub mod models;

pub use calculations::{
    ContributionPlan, ContributionPlanInput, HsaCoverage, LimitChecker, Optimizer, PayFrequency,
    PaycheckSchedule, ScheduleError,
};
pub use models::*;
