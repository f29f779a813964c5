pub mod export;
pub mod household;
pub mod jobs;
pub mod year_config;

pub use export::{ExportError, PaycheckRow, write_paychecks, write_paychecks_to_file};
pub use household::{
    HouseholdOptions, HouseholdProjection, JobProjection, apply_optimized, combined_starting_ytd,
    optimize_household, project_household,
};
pub use jobs::{JobLoadError, JobLoader, JobRecord, JobSpec};
pub use year_config::{
    MAX_TAX_YEAR, MIN_TAX_YEAR, YearConfigError, YearConfigStore, discover_years,
    load_year_config, parse_year_config, validate_config, validate_year,
};
