//! Per-year configuration files.
//!
//! Each tax year lives in its own `<year>.toml` file inside one directory:
//!
//! ```toml
//! tax_year = 2026
//! annualization_periods = 26
//!
//! [limits]
//! employee_deferral_limit = 23000
//! annual_additions_limit = 66000
//! hsa_family_limit = 8300
//! hsa_individual_limit = 4150
//! catch_up_contribution = 7500
//!
//! [federal]
//! standard_deduction = 30700
//!
//! [[federal.brackets]]
//! upper_bound = 23200
//! rate = 0.10
//!
//! [[federal.brackets]]
//! rate = 0.12
//!
//! # [state] follows the same shape as [federal]
//! ```
//!
//! A bracket without `upper_bound` is the catch-all bracket and must be last.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};

use paycheck_core::{Bracket, TaxYearConfig, WithholdingTable};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

pub const MIN_TAX_YEAR: i32 = 2020;
pub const MAX_TAX_YEAR: i32 = 2050;

/// Errors that can occur when loading year configuration.
#[derive(Debug, Error)]
pub enum YearConfigError {
    #[error("Year {0} is outside valid range ({MIN_TAX_YEAR}-{MAX_TAX_YEAR})")]
    YearOutOfRange(i32),

    #[error("Configuration file not found for year {year}: {path}")]
    NotFound { year: i32, path: String },

    #[error("No tax year configuration files found in {0}")]
    NoConfigurations(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration for year {year}: {source}")]
    Parse {
        year: i32,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration for year {year}: {reason}")]
    Invalid { year: i32, reason: String },
}

pub fn validate_year(year: i32) -> Result<(), YearConfigError> {
    if (MIN_TAX_YEAR..=MAX_TAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(YearConfigError::YearOutOfRange(year))
    }
}

/// Parses and validates the configuration for `year` from TOML text.
pub fn parse_year_config(
    content: &str,
    year: i32,
) -> Result<TaxYearConfig, YearConfigError> {
    let config: TaxYearConfig =
        toml::from_str(content).map_err(|source| YearConfigError::Parse { year, source })?;
    validate_config(&config, year)?;
    Ok(config)
}

/// Checks a parsed configuration for internal consistency.
pub fn validate_config(
    config: &TaxYearConfig,
    year: i32,
) -> Result<(), YearConfigError> {
    let invalid = |reason: String| YearConfigError::Invalid { year, reason };

    validate_year(year)?;
    if config.tax_year != year {
        return Err(invalid(format!(
            "tax_year {} does not match file year",
            config.tax_year
        )));
    }

    let limits = &config.limits;
    for (name, value) in [
        ("employee_deferral_limit", limits.employee_deferral_limit),
        ("annual_additions_limit", limits.annual_additions_limit),
        ("hsa_family_limit", limits.hsa_family_limit),
        ("hsa_individual_limit", limits.hsa_individual_limit),
        ("catch_up_contribution", limits.catch_up_contribution),
    ] {
        if value <= Decimal::ZERO {
            return Err(invalid(format!("{name} must be greater than 0")));
        }
    }

    if config.annualization_periods == 0 {
        return Err(invalid("annualization_periods must be greater than 0".into()));
    }

    validate_table("federal", &config.federal).map_err(invalid)?;
    validate_table("state", &config.state).map_err(invalid)?;

    Ok(())
}

fn validate_table(
    name: &str,
    table: &WithholdingTable,
) -> Result<(), String> {
    if table.standard_deduction < Decimal::ZERO {
        return Err(format!("{name} standard_deduction must not be negative"));
    }

    let Some((last, bounded)) = table.brackets.split_last() else {
        return Err(format!("{name} table has no brackets"));
    };
    if !last.is_unbounded() {
        return Err(format!("{name} table must end with an unbounded bracket"));
    }

    let mut previous: Option<&Bracket> = None;
    let mut lower_bound = Decimal::ZERO;
    for (index, bracket) in table.brackets.iter().enumerate() {
        if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
            return Err(format!(
                "{name} bracket {} rate {} is outside 0-1",
                index + 1,
                bracket.rate
            ));
        }
        if previous.is_some_and(|p| bracket.rate < p.rate) {
            return Err(format!(
                "{name} bracket {} rate decreases",
                index + 1
            ));
        }
        if index < bounded.len() {
            match bracket.upper_bound {
                Some(upper) if upper > lower_bound => lower_bound = upper,
                Some(_) => {
                    return Err(format!(
                        "{name} bracket {} upper bound is not ascending",
                        index + 1
                    ));
                }
                None => {
                    return Err(format!(
                        "{name} bracket {} is unbounded but not last",
                        index + 1
                    ));
                }
            }
        }
        previous = Some(bracket);
    }

    Ok(())
}

/// Loads `<year>.toml` from `dir`.
pub fn load_year_config(
    dir: &Path,
    year: i32,
) -> Result<TaxYearConfig, YearConfigError> {
    validate_year(year)?;

    let path = config_path(dir, year);
    let content = fs::read_to_string(&path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            YearConfigError::NotFound {
                year,
                path: path.display().to_string(),
            }
        } else {
            YearConfigError::Io {
                path: path.display().to_string(),
                source,
            }
        }
    })?;

    parse_year_config(&content, year)
}

fn config_path(
    dir: &Path,
    year: i32,
) -> PathBuf {
    dir.join(format!("{year}.toml"))
}

/// Years with a `<year>.toml` file in `dir`, ascending.
///
/// Files whose stem is not a positive integer are ignored.
pub fn discover_years(dir: &Path) -> Result<Vec<i32>, YearConfigError> {
    let entries = fs::read_dir(dir).map_err(|source| YearConfigError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let mut years: Vec<i32> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .filter_map(|path| path.file_stem()?.to_str()?.parse::<i32>().ok())
        .filter(|year| *year > 0)
        .collect();
    years.sort_unstable();
    years.dedup();

    Ok(years)
}

/// Caching access to a directory of year configurations.
#[derive(Debug)]
pub struct YearConfigStore {
    dir: PathBuf,
    available_years: Option<Vec<i32>>,
    cache: HashMap<i32, TaxYearConfig>,
}

impl YearConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            available_years: None,
            cache: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Years with a configuration file inside the supported range.
    ///
    /// Out-of-range years are skipped with a warning. Fails when no usable
    /// year remains.
    pub fn available_years(&mut self) -> Result<&[i32], YearConfigError> {
        if self.available_years.is_none() {
            let years: Vec<i32> = discover_years(&self.dir)?
                .into_iter()
                .filter(|year| {
                    let valid = validate_year(*year).is_ok();
                    if !valid {
                        warn!(
                            year,
                            "skipping year outside valid range ({MIN_TAX_YEAR}-{MAX_TAX_YEAR})"
                        );
                    }
                    valid
                })
                .collect();

            if years.is_empty() {
                return Err(YearConfigError::NoConfigurations(
                    self.dir.display().to_string(),
                ));
            }

            debug!(dir = %self.dir.display(), ?years, "discovered tax years");
            self.available_years = Some(years);
        }

        Ok(self.available_years.as_deref().unwrap_or_default())
    }

    /// The most recent available year.
    pub fn default_year(&mut self) -> Result<i32, YearConfigError> {
        let dir = self.dir.display().to_string();
        self.available_years()?
            .last()
            .copied()
            .ok_or(YearConfigError::NoConfigurations(dir))
    }

    /// Loads and validates the configuration for `year`, caching the result.
    pub fn get(
        &mut self,
        year: i32,
    ) -> Result<&TaxYearConfig, YearConfigError> {
        validate_year(year)?;

        match self.cache.entry(year) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let config = load_year_config(&self.dir, year)?;
                debug!(year, "loaded tax year configuration");
                Ok(entry.insert(config))
            }
        }
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.available_years = None;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const VALID_2026: &str = r#"
tax_year = 2026

[limits]
employee_deferral_limit = 23000
annual_additions_limit = 66000
hsa_family_limit = 8300
hsa_individual_limit = 4150
catch_up_contribution = 7500

[federal]
standard_deduction = 30700

[[federal.brackets]]
upper_bound = 23200
rate = 0.10

[[federal.brackets]]
rate = 0.12

[state]
standard_deduction = 10404

[[state.brackets]]
upper_bound = 20659
rate = 0.01

[[state.brackets]]
rate = 0.02
"#;

    #[test]
    fn test_parse_valid_config() {
        let config = parse_year_config(VALID_2026, 2026).expect("Failed to parse config");

        assert_eq!(config.tax_year, 2026);
        assert_eq!(config.limits.employee_deferral_limit, dec!(23000));
        assert_eq!(config.limits.hsa_individual_limit, dec!(4150));
        assert_eq!(config.federal.standard_deduction, dec!(30700));
        assert_eq!(config.federal.brackets, vec![
            Bracket::new(dec!(23200), dec!(0.10)),
            Bracket::unbounded(dec!(0.12)),
        ]);
        assert_eq!(config.state.brackets[0].rate, dec!(0.01));
    }

    #[test]
    fn test_parse_defaults_annualization_periods() {
        let config = parse_year_config(VALID_2026, 2026).expect("Failed to parse config");

        assert_eq!(config.annualization_periods, 26);
    }

    #[test]
    fn test_parse_rejects_malformed_toml() {
        let err = parse_year_config("tax_year = ", 2026).expect_err("Should fail to parse");

        assert!(matches!(err, YearConfigError::Parse { year: 2026, .. }));
    }

    #[test]
    fn test_parse_rejects_missing_section() {
        let err = parse_year_config("tax_year = 2026\n", 2026).expect_err("Should fail to parse");

        assert!(
            err.to_string().contains("missing field"),
            "Expected 'missing field' in error, got: {}",
            err
        );
    }

    #[test]
    fn test_validate_year_range() {
        assert!(validate_year(2020).is_ok());
        assert!(validate_year(2050).is_ok());
        assert!(matches!(
            validate_year(2019),
            Err(YearConfigError::YearOutOfRange(2019))
        ));
        assert_eq!(
            validate_year(2051).expect_err("out of range").to_string(),
            "Year 2051 is outside valid range (2020-2050)"
        );
    }

    #[test]
    fn test_validate_rejects_year_mismatch() {
        let err = parse_year_config(VALID_2026, 2025).expect_err("Should reject mismatch");

        assert_eq!(
            err.to_string(),
            "Invalid configuration for year 2025: tax_year 2026 does not match file year"
        );
    }

    #[test]
    fn test_validate_rejects_non_positive_limit() {
        let content = VALID_2026.replace("hsa_family_limit = 8300", "hsa_family_limit = 0");

        let err = parse_year_config(&content, 2026).expect_err("Should reject zero limit");

        assert_eq!(
            err.to_string(),
            "Invalid configuration for year 2026: hsa_family_limit must be greater than 0"
        );
    }

    #[test]
    fn test_validate_rejects_zero_periods() {
        let content = format!("annualization_periods = 0\n{VALID_2026}");

        let err = parse_year_config(&content, 2026).expect_err("Should reject zero periods");

        assert!(matches!(err, YearConfigError::Invalid { year: 2026, .. }));
    }

    #[test]
    fn test_validate_rejects_bounded_last_bracket() {
        let content = VALID_2026.replace("[[state.brackets]]\nrate = 0.02", "[[state.brackets]]\nupper_bound = 50000\nrate = 0.02");

        let err = parse_year_config(&content, 2026).expect_err("Should reject bounded table");

        assert!(err.to_string().contains("state table must end with an unbounded bracket"));
    }

    #[test]
    fn test_validate_table_rules() {
        let table = |brackets| WithholdingTable {
            standard_deduction: dec!(0),
            brackets,
        };

        assert!(validate_table("t", &table(vec![Bracket::unbounded(dec!(0.1))])).is_ok());
        assert_eq!(
            validate_table("t", &table(vec![])),
            Err("t table has no brackets".to_string())
        );
        assert_eq!(
            validate_table(
                "t",
                &table(vec![
                    Bracket::new(dec!(1000), dec!(0.2)),
                    Bracket::unbounded(dec!(0.1)),
                ])
            ),
            Err("t bracket 2 rate decreases".to_string())
        );
        assert_eq!(
            validate_table(
                "t",
                &table(vec![
                    Bracket::new(dec!(1000), dec!(0.1)),
                    Bracket::new(dec!(1000), dec!(0.2)),
                    Bracket::unbounded(dec!(0.3)),
                ])
            ),
            Err("t bracket 2 upper bound is not ascending".to_string())
        );
        assert_eq!(
            validate_table(
                "t",
                &table(vec![
                    Bracket::unbounded(dec!(0.1)),
                    Bracket::unbounded(dec!(0.2)),
                ])
            ),
            Err("t bracket 1 is unbounded but not last".to_string())
        );
        assert_eq!(
            validate_table("t", &table(vec![Bracket::unbounded(dec!(1.5))])),
            Err("t bracket 1 rate 1.5 is outside 0-1".to_string())
        );
    }
}
