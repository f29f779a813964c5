use serde::{Deserialize, Serialize};

/// Outcome of checking a year of paychecks against statutory limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitResult {
    pub within_limits: bool,
    pub warnings: Vec<String>,
}

impl LimitResult {
    pub fn from_warnings(warnings: Vec<String>) -> Self {
        Self {
            within_limits: warnings.is_empty(),
            warnings,
        }
    }
}
