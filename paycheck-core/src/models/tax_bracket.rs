use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One marginal bracket of a progressive tax table.
///
/// Brackets are listed in ascending order of `upper_bound`. The last bracket
/// of a table has no upper bound and catches all remaining income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    /// Income at which this bracket ends; `None` for the catch-all bracket.
    #[serde(default)]
    pub upper_bound: Option<Decimal>,

    /// Marginal rate as a fraction (e.g. `0.12` for 12%).
    pub rate: Decimal,
}

impl Bracket {
    pub fn new(
        upper_bound: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            upper_bound: Some(upper_bound),
            rate,
        }
    }

    pub fn unbounded(rate: Decimal) -> Self {
        Self {
            upper_bound: None,
            rate,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.upper_bound.is_none()
    }
}
