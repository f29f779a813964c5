use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use paycheck_core::PaycheckResult;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(String),

    #[error("failed to create {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Csv(err.to_string())
    }
}

/// One exported paycheck, labelled with the job it belongs to.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaycheckRow<'a> {
    pub job: &'a str,
    pub date: NaiveDate,
    pub gross: Decimal,
    pub employee_traditional: Decimal,
    pub employee_roth: Decimal,
    pub employee_after_tax: Decimal,
    pub employee_hsa: Decimal,
    pub employer_match: Decimal,
    pub employer_hsa: Decimal,
    pub federal_tax: Decimal,
    pub state_tax: Decimal,
    pub net_cash: Decimal,
    pub ytd_employee_401k: Decimal,
    pub ytd_hsa: Decimal,
    pub ytd_match: Decimal,
}

impl<'a> PaycheckRow<'a> {
    pub fn new(
        job: &'a str,
        paycheck: &PaycheckResult,
    ) -> Self {
        Self {
            job,
            date: paycheck.date,
            gross: paycheck.gross,
            employee_traditional: paycheck.employee_traditional,
            employee_roth: paycheck.employee_roth,
            employee_after_tax: paycheck.employee_after_tax,
            employee_hsa: paycheck.employee_hsa,
            employer_match: paycheck.employer_match,
            employer_hsa: paycheck.employer_hsa,
            federal_tax: paycheck.federal_tax,
            state_tax: paycheck.state_tax,
            net_cash: paycheck.net_cash,
            ytd_employee_401k: paycheck.ytd_employee_401k,
            ytd_hsa: paycheck.ytd_hsa,
            ytd_match: paycheck.ytd_match,
        }
    }
}

/// Writes every job's paychecks as CSV rows, jobs in the order given.
///
/// Returns the number of rows written, excluding the header.
pub fn write_paychecks<'a, W, I>(
    writer: W,
    jobs: I,
) -> Result<usize, ExportError>
where
    W: Write,
    I: IntoIterator<Item = (&'a str, &'a [PaycheckResult])>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut written = 0;

    for (job, paychecks) in jobs {
        for paycheck in paychecks {
            csv_writer.serialize(PaycheckRow::new(job, paycheck))?;
            written += 1;
        }
    }

    csv_writer
        .flush()
        .map_err(|err| ExportError::Csv(err.to_string()))?;
    Ok(written)
}

pub fn write_paychecks_to_file<'a, I>(
    path: &Path,
    jobs: I,
) -> Result<usize, ExportError>
where
    I: IntoIterator<Item = (&'a str, &'a [PaycheckResult])>,
{
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    write_paychecks(file, jobs)
}
