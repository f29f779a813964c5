use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use paycheck_core::calculations::common::percent_of;
use paycheck_core::{
    ContributionInput, ContributionPlanInput, JobDescriptor, PaycheckSchedule, ScheduleError,
    StartingYtd,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading job rows.
#[derive(Debug, Error)]
pub enum JobLoadError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("row {row}: {field} must be between 0 and 100, got {value}")]
    PercentOutOfRange {
        row: usize,
        field: &'static str,
        value: Decimal,
    },

    #[error("row {row}: {field} must be greater than or equal to 0, got {value}")]
    NegativeAmount {
        row: usize,
        field: &'static str,
        value: Decimal,
    },

    #[error("row {row}: total contribution percentage {total} exceeds 100")]
    ContributionSumExceeded { row: usize, total: Decimal },

    #[error("row {row}: {source}")]
    Schedule {
        row: usize,
        #[source]
        source: ScheduleError,
    },
}

impl From<csv::Error> for JobLoadError {
    fn from(err: csv::Error) -> Self {
        JobLoadError::CsvParse(err.to_string())
    }
}

/// A single record from a jobs CSV file.
///
/// Required columns:
/// - `name`: Employer or job label
/// - `gross_per_paycheck`: Gross pay per paycheck
/// - `first_paycheck_date`: ISO date of the first paycheck of the year
///
/// Optional columns (blank or absent means default):
/// - `frequency`: weekly, biweekly, semimonthly or monthly
/// - `paycheck_count`: Number of paychecks; caps a frequency schedule
/// - `traditional_pct`, `roth_pct`, `after_tax_pct`, `hsa_pct`: Elections
/// - `employer_match_rate`: Match as a fraction (e.g., 0.5)
/// - `employer_match_cap_pct`: Percentage of gross eligible for match
/// - `employer_hsa_per_paycheck`: Employer HSA contribution
/// - `hsa_allowed`: Employee HSA capacity per paycheck (default: current HSA election)
/// - `match_threshold_pct`: Traditional percentage that captures the full match
///   (default: `employer_match_cap_pct`)
/// - `max_traditional_pct`: Plan ceiling for traditional deferrals (default: 100)
/// - `allow_roth`, `allow_after_tax`: Plan features (default: on when elected)
/// - `true_up`: Employer reconciles match at year-end (default: false)
/// - `preferred_roth_pct`, `preferred_after_tax_pct`: Optimizer preferences
///   (default: current election)
/// - `starting_ytd_pretax`, `starting_ytd_roth`, `starting_ytd_after_tax`,
///   `starting_ytd_hsa`, `starting_ytd_match`: Balances from earlier payroll
///   this year
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct JobRecord {
    pub name: String,
    pub gross_per_paycheck: Decimal,
    pub first_paycheck_date: NaiveDate,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub paycheck_count: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub traditional_pct: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub roth_pct: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub after_tax_pct: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub hsa_pct: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub employer_match_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub employer_match_cap_pct: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub employer_hsa_per_paycheck: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub hsa_allowed: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub match_threshold_pct: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub max_traditional_pct: Option<Decimal>,
    #[serde(default)]
    pub allow_roth: Option<bool>,
    #[serde(default)]
    pub allow_after_tax: Option<bool>,
    #[serde(default)]
    pub true_up: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub preferred_roth_pct: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub preferred_after_tax_pct: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub starting_ytd_pretax: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub starting_ytd_roth: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub starting_ytd_after_tax: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub starting_ytd_hsa: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub starting_ytd_match: Option<Decimal>,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// A validated job: its calendar, its plan terms and its optimizer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    pub schedule: PaycheckSchedule,
    pub plan: ContributionPlanInput,
    pub hsa_allowed: Decimal,
    pub match_threshold_pct: Decimal,
    pub max_traditional_pct: Decimal,
    pub allow_roth: bool,
    pub allow_after_tax: bool,
    pub true_up: bool,
    pub preferred_roth_pct: Decimal,
    pub preferred_after_tax_pct: Decimal,
}

impl JobSpec {
    pub fn paycheck_dates(
        &self,
        year: i32,
    ) -> Vec<NaiveDate> {
        self.schedule.dates_for_year(year).collect()
    }

    /// Optimizer view of this job, sized to its paychecks in `year`.
    pub fn descriptor(
        &self,
        year: i32,
    ) -> JobDescriptor {
        let paycheck_count = self.schedule.dates_for_year(year).count();

        JobDescriptor {
            name: self.name.clone(),
            gross_per_paycheck: self.plan.gross_per_paycheck,
            paycheck_count: u32::try_from(paycheck_count).unwrap_or(u32::MAX),
            hsa_allowed: self.hsa_allowed,
            match_threshold_pct: self.match_threshold_pct,
            max_traditional_pct: self.max_traditional_pct,
            allow_roth: self.allow_roth,
            allow_after_tax: self.allow_after_tax,
            true_up: self.true_up,
            preferred_roth_pct: self.preferred_roth_pct,
            preferred_after_tax_pct: self.preferred_after_tax_pct,
        }
    }
}

impl JobRecord {
    /// Validates the record and resolves its defaults.
    ///
    /// `row` is the 1-based data row, used in error messages.
    pub fn into_spec(
        self,
        row: usize,
    ) -> Result<JobSpec, JobLoadError> {
        let contributions = ContributionInput::new(
            percent_field(row, "traditional_pct", self.traditional_pct)?,
            percent_field(row, "roth_pct", self.roth_pct)?,
            percent_field(row, "after_tax_pct", self.after_tax_pct)?,
            percent_field(row, "hsa_pct", self.hsa_pct)?,
        );

        let total = contributions.retirement_pct();
        if total > Decimal::ONE_HUNDRED {
            return Err(JobLoadError::ContributionSumExceeded { row, total });
        }

        let gross = amount_field(row, "gross_per_paycheck", Some(self.gross_per_paycheck))?;
        let match_cap_pct = percent_field(row, "employer_match_cap_pct", self.employer_match_cap_pct)?;

        let schedule = PaycheckSchedule::new(
            self.first_paycheck_date,
            self.frequency.as_deref().filter(|f| !f.trim().is_empty()),
            self.paycheck_count,
        )
        .map_err(|source| JobLoadError::Schedule { row, source })?;

        let starting_ytd = StartingYtd {
            traditional: amount_field(row, "starting_ytd_pretax", self.starting_ytd_pretax)?,
            roth: amount_field(row, "starting_ytd_roth", self.starting_ytd_roth)?,
            after_tax: amount_field(row, "starting_ytd_after_tax", self.starting_ytd_after_tax)?,
            hsa: amount_field(row, "starting_ytd_hsa", self.starting_ytd_hsa)?,
            employer_match: amount_field(row, "starting_ytd_match", self.starting_ytd_match)?,
        };

        let plan = ContributionPlanInput::new(
            gross,
            contributions,
            amount_field(row, "employer_match_rate", self.employer_match_rate)?,
            match_cap_pct,
        )
        .with_employer_hsa(amount_field(
            row,
            "employer_hsa_per_paycheck",
            self.employer_hsa_per_paycheck,
        )?)
        .with_starting_ytd(starting_ytd);

        let hsa_allowed = match self.hsa_allowed {
            Some(_) => amount_field(row, "hsa_allowed", self.hsa_allowed)?,
            None => percent_of(contributions.hsa_pct, gross),
        };

        Ok(JobSpec {
            name: self.name,
            schedule,
            plan,
            hsa_allowed,
            match_threshold_pct: percent_or(
                row,
                "match_threshold_pct",
                self.match_threshold_pct,
                match_cap_pct,
            )?,
            max_traditional_pct: percent_or(
                row,
                "max_traditional_pct",
                self.max_traditional_pct,
                Decimal::ONE_HUNDRED,
            )?,
            allow_roth: self
                .allow_roth
                .unwrap_or(contributions.roth_pct > Decimal::ZERO),
            allow_after_tax: self
                .allow_after_tax
                .unwrap_or(contributions.after_tax_pct > Decimal::ZERO),
            true_up: self.true_up.unwrap_or(false),
            preferred_roth_pct: percent_or(
                row,
                "preferred_roth_pct",
                self.preferred_roth_pct,
                contributions.roth_pct,
            )?,
            preferred_after_tax_pct: percent_or(
                row,
                "preferred_after_tax_pct",
                self.preferred_after_tax_pct,
                contributions.after_tax_pct,
            )?,
        })
    }
}

fn percent_field(
    row: usize,
    field: &'static str,
    value: Option<Decimal>,
) -> Result<Decimal, JobLoadError> {
    let value = value.unwrap_or_default();
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(JobLoadError::PercentOutOfRange { row, field, value });
    }
    Ok(value)
}

/// Like [`percent_field`], but an absent value takes `default` unchecked.
fn percent_or(
    row: usize,
    field: &'static str,
    value: Option<Decimal>,
    default: Decimal,
) -> Result<Decimal, JobLoadError> {
    match value {
        Some(_) => percent_field(row, field, value),
        None => Ok(default),
    }
}

fn amount_field(
    row: usize,
    field: &'static str,
    value: Option<Decimal>,
) -> Result<Decimal, JobLoadError> {
    let value = value.unwrap_or_default();
    if value < Decimal::ZERO {
        return Err(JobLoadError::NegativeAmount { row, field, value });
    }
    Ok(value)
}

/// Loader for job definitions from CSV files.
pub struct JobLoader;

impl JobLoader {
    /// Parse raw job records from a CSV reader.
    ///
    /// Fields are trimmed; every row must have as many fields as the header.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<JobRecord>, JobLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(false)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: JobRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Parse and validate job rows, in file order.
    pub fn load<R: Read>(reader: R) -> Result<Vec<JobSpec>, JobLoadError> {
        Self::parse(reader)?
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_spec(index + 1))
            .collect()
    }

    pub fn load_from_str(csv: &str) -> Result<Vec<JobSpec>, JobLoadError> {
        Self::load(csv.as_bytes())
    }

    pub fn load_from_file(path: &Path) -> Result<Vec<JobSpec>, JobLoadError> {
        let file = File::open(path).map_err(|source| JobLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load(file)
    }
}

#[cfg(test)]
mod tests {
    use paycheck_core::PayFrequency;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str = "name,gross_per_paycheck,first_paycheck_date,frequency,paycheck_count,\
traditional_pct,roth_pct,after_tax_pct,hsa_pct,employer_match_rate,employer_match_cap_pct";

    fn csv_with(row: &str) -> String {
        format!("{HEADER}\n{row}\n")
    }

    // =========================================================================
    // parse
    // =========================================================================

    #[test]
    fn test_parse_minimal_columns() {
        let csv = "name,gross_per_paycheck,first_paycheck_date\nAcme,4000,2026-01-09\n";

        let records = JobLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Acme");
        assert_eq!(records[0].gross_per_paycheck, dec!(4000));
        assert_eq!(records[0].frequency, None);
        assert_eq!(records[0].traditional_pct, None);
    }

    #[test]
    fn test_parse_blank_optional_fields_are_none() {
        let csv = csv_with("Acme, 4000 ,2026-01-09,biweekly,,10,,,,0.5,");

        let records = JobLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records[0].gross_per_paycheck, dec!(4000));
        assert_eq!(records[0].paycheck_count, None);
        assert_eq!(records[0].traditional_pct, Some(dec!(10)));
        assert_eq!(records[0].roth_pct, None);
        assert_eq!(records[0].employer_match_rate, Some(dec!(0.5)));
        assert_eq!(records[0].employer_match_cap_pct, None);
    }

    #[test]
    fn test_parse_invalid_decimal() {
        let csv = csv_with("Acme,4000,2026-01-09,biweekly,,ten,0,0,0,0,0");

        let err = JobLoader::parse(csv.as_bytes()).expect_err("Should fail for invalid decimal");

        let JobLoadError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(
            msg.contains("deserialize"),
            "Expected deserialize error, got: {}",
            msg
        );
    }

    #[test]
    fn test_parse_missing_required_column() {
        let csv = "name,gross_per_paycheck\nAcme,4000\n";

        let err = JobLoader::parse(csv.as_bytes()).expect_err("Should fail for missing column");

        let JobLoadError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(
            msg.contains("missing field"),
            "Expected 'missing field' in error, got: {}",
            msg
        );
    }

    #[test]
    fn test_parse_rejects_short_row() {
        let csv = csv_with("Acme,4000,2026-01-09,biweekly");

        assert!(matches!(
            JobLoader::parse(csv.as_bytes()),
            Err(JobLoadError::CsvParse(_))
        ));
    }

    #[test]
    fn test_parse_header_only() {
        let records = JobLoader::parse(csv_with("").trim_end().as_bytes())
            .expect("Failed to parse CSV");

        assert!(records.is_empty());
    }

    // =========================================================================
    // validation and defaults
    // =========================================================================

    #[test]
    fn test_load_resolves_defaults() {
        let csv = csv_with("Acme,4000,2026-01-09,biweekly,,10,5,0,2,0.5,6");

        let jobs = JobLoader::load_from_str(&csv).expect("Failed to load jobs");

        let job = &jobs[0];
        assert_eq!(job.schedule.frequency(), Some(PayFrequency::Biweekly));
        assert_eq!(
            job.plan.contribution_input,
            ContributionInput::new(dec!(10), dec!(5), dec!(0), dec!(2))
        );
        assert_eq!(job.plan.employer_match_rate, dec!(0.5));
        assert_eq!(job.plan.employer_match_cap_pct, dec!(6));
        assert_eq!(job.hsa_allowed, dec!(80));
        assert_eq!(job.match_threshold_pct, dec!(6));
        assert_eq!(job.max_traditional_pct, dec!(100));
        assert!(job.allow_roth);
        assert!(!job.allow_after_tax);
        assert!(!job.true_up);
        assert_eq!(job.preferred_roth_pct, dec!(5));
        assert_eq!(job.preferred_after_tax_pct, dec!(0));
    }

    #[test]
    fn test_load_explicit_optimizer_columns() {
        let csv = "name,gross_per_paycheck,first_paycheck_date,frequency,hsa_allowed,\
match_threshold_pct,max_traditional_pct,allow_roth,allow_after_tax,true_up,preferred_roth_pct\n\
Acme,4000,2026-01-09,biweekly,150,5,50,true,false,true,3\n";

        let jobs = JobLoader::load_from_str(csv).expect("Failed to load jobs");

        let job = &jobs[0];
        assert_eq!(job.hsa_allowed, dec!(150));
        assert_eq!(job.match_threshold_pct, dec!(5));
        assert_eq!(job.max_traditional_pct, dec!(50));
        assert!(job.allow_roth);
        assert!(job.true_up);
        assert_eq!(job.preferred_roth_pct, dec!(3));
    }

    #[test]
    fn test_load_starting_balances_by_bucket() {
        let csv = "name,gross_per_paycheck,first_paycheck_date,frequency,starting_ytd_pretax,\
starting_ytd_roth,starting_ytd_after_tax,starting_ytd_hsa,starting_ytd_match\n\
Acme,4000,2026-07-03,biweekly,9000,1000,500,2500,800\n";

        let jobs = JobLoader::load_from_str(csv).expect("Failed to load jobs");

        assert_eq!(jobs[0].plan.starting_ytd, StartingYtd {
            traditional: dec!(9000),
            roth: dec!(1000),
            after_tax: dec!(500),
            hsa: dec!(2500),
            employer_match: dec!(800),
        });
    }

    #[test]
    fn test_load_rejects_negative_starting_balance() {
        let csv = "name,gross_per_paycheck,first_paycheck_date,frequency,starting_ytd_roth\n\
Acme,4000,2026-07-03,biweekly,-1\n";

        assert!(matches!(
            JobLoader::load_from_str(csv),
            Err(JobLoadError::NegativeAmount { row: 1, field: "starting_ytd_roth", .. })
        ));
    }

    #[test]
    fn test_load_rejects_percentage_above_100() {
        let csv = csv_with("Acme,4000,2026-01-09,biweekly,,101,0,0,0,0,0");

        let err = JobLoader::load_from_str(&csv).expect_err("Should reject 101%");

        match err {
            JobLoadError::PercentOutOfRange { row, field, value } => {
                assert_eq!(row, 1);
                assert_eq!(field, "traditional_pct");
                assert_eq!(value, dec!(101));
            }
            other => panic!("expected PercentOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_load_rejects_negative_percentage() {
        let csv = csv_with("Acme,4000,2026-01-09,biweekly,,0,0,0,-1,0,0");

        assert!(matches!(
            JobLoader::load_from_str(&csv),
            Err(JobLoadError::PercentOutOfRange { field: "hsa_pct", .. })
        ));
    }

    #[test]
    fn test_load_rejects_contribution_sum_over_100() {
        let csv = format!(
            "{HEADER}\nFirst,4000,2026-01-09,biweekly,,10,0,0,0,0,0\n\
Second,3000,2026-01-02,weekly,,60,30,20,0,0,0\n"
        );

        let err = JobLoader::load_from_str(&csv).expect_err("Should reject 110%");

        match err {
            JobLoadError::ContributionSumExceeded { row, total } => {
                assert_eq!(row, 2);
                assert_eq!(total, dec!(110));
            }
            other => panic!("expected ContributionSumExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_load_hsa_does_not_count_toward_sum() {
        let csv = csv_with("Acme,4000,2026-01-09,biweekly,,60,20,20,5,0,0");

        assert!(JobLoader::load_from_str(&csv).is_ok());
    }

    #[test]
    fn test_load_rejects_negative_gross() {
        let csv = csv_with("Acme,-4000,2026-01-09,biweekly,,0,0,0,0,0,0");

        assert!(matches!(
            JobLoader::load_from_str(&csv),
            Err(JobLoadError::NegativeAmount { field: "gross_per_paycheck", .. })
        ));
    }

    #[test]
    fn test_load_requires_frequency_or_count() {
        let csv = csv_with("Acme,4000,2026-01-09,,,0,0,0,0,0,0");

        let err = JobLoader::load_from_str(&csv).expect_err("Should require a schedule");

        match err {
            JobLoadError::Schedule { row, source } => {
                assert_eq!(row, 1);
                assert_eq!(source, ScheduleError::MissingFrequencyOrCount);
            }
            other => panic!("expected Schedule error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_rejects_unknown_frequency() {
        let csv = csv_with("Acme,4000,2026-01-09,fortnightly,,0,0,0,0,0,0");

        let err = JobLoader::load_from_str(&csv).expect_err("Should reject frequency");

        assert_eq!(err.to_string(), "row 1: unsupported pay frequency 'fortnightly'");
    }

    // =========================================================================
    // JobSpec
    // =========================================================================

    #[test]
    fn test_descriptor_counts_paychecks_in_year() {
        let csv = csv_with("Acme,4000,2026-12-04,biweekly,,0,0,0,0,0.5,4");
        let jobs = JobLoader::load_from_str(&csv).expect("Failed to load jobs");

        let descriptor = jobs[0].descriptor(2026);

        // Dec 4 and Dec 18
        assert_eq!(descriptor.paycheck_count, 2);
        assert_eq!(descriptor.name, "Acme");
        assert_eq!(descriptor.match_threshold_pct, dec!(4));
        assert_eq!(jobs[0].paycheck_dates(2026).len(), 2);
    }

    #[test]
    fn test_descriptor_for_other_year_is_empty() {
        let csv = csv_with("Acme,4000,2026-01-09,biweekly,,0,0,0,0,0,0");
        let jobs = JobLoader::load_from_str(&csv).expect("Failed to load jobs");

        assert_eq!(jobs[0].descriptor(2027).paycheck_count, 0);
    }
}
