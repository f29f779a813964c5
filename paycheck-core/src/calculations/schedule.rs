//! Paycheck date generation for one job in one tax year.
//!
//! A schedule starts at the first paycheck date and steps forward by a fixed
//! number of days determined by the pay frequency:
//!
//! | Frequency     | Increment |
//! |---------------|-----------|
//! | `weekly`      | 7 days    |
//! | `biweekly`    | 14 days   |
//! | `semimonthly` | 15 days   |
//! | `monthly`     | 30 days   |
//!
//! A schedule configured with only a paycheck count has no increment and
//! yields just the first paycheck date.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use paycheck_core::calculations::{PayFrequency, PaycheckSchedule};
//!
//! let first = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
//! let schedule = PaycheckSchedule::with_frequency(first, PayFrequency::Biweekly);
//!
//! let dates: Vec<_> = schedule.dates_for_year(2026).collect();
//! assert_eq!(dates[1], NaiveDate::from_ymd_opt(2026, 1, 19).unwrap());
//! assert_eq!(dates.len(), 26);
//! ```

use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while configuring a paycheck schedule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// Neither a frequency nor a paycheck count was supplied.
    #[error("either a pay frequency or a paycheck count is required")]
    MissingFrequencyOrCount,

    /// The frequency name is not one of the supported values.
    #[error("unsupported pay frequency '{0}'")]
    UnsupportedFrequency(String),
}

/// How often a job pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayFrequency {
    Weekly,
    Biweekly,
    Semimonthly,
    Monthly,
}

impl PayFrequency {
    /// Days between consecutive paychecks.
    pub fn increment_days(self) -> u64 {
        match self {
            Self::Weekly => 7,
            Self::Biweekly => 14,
            Self::Semimonthly => 15,
            Self::Monthly => 30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Semimonthly => "semimonthly",
            Self::Monthly => "monthly",
        }
    }
}

impl FromStr for PayFrequency {
    type Err = ScheduleError;

    /// Case-insensitive; `semi_monthly` and `semi-monthly` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "semimonthly" | "semi_monthly" | "semi-monthly" => Ok(Self::Semimonthly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(ScheduleError::UnsupportedFrequency(s.to_string())),
        }
    }
}

impl fmt::Display for PayFrequency {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The paycheck calendar of a single job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleFields")]
pub struct PaycheckSchedule {
    first_paycheck_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency: Option<PayFrequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paycheck_count: Option<u32>,
}

/// Unvalidated serde form of [`PaycheckSchedule`].
#[derive(Deserialize)]
struct ScheduleFields {
    first_paycheck_date: NaiveDate,
    #[serde(default)]
    frequency: Option<PayFrequency>,
    #[serde(default)]
    paycheck_count: Option<u32>,
}

impl TryFrom<ScheduleFields> for PaycheckSchedule {
    type Error = ScheduleError;

    fn try_from(fields: ScheduleFields) -> Result<Self, Self::Error> {
        if fields.frequency.is_none() && fields.paycheck_count.is_none() {
            return Err(ScheduleError::MissingFrequencyOrCount);
        }

        Ok(Self {
            first_paycheck_date: fields.first_paycheck_date,
            frequency: fields.frequency,
            paycheck_count: fields.paycheck_count,
        })
    }
}

impl PaycheckSchedule {
    /// Builds a schedule from a frequency name and/or a paycheck count.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::MissingFrequencyOrCount`] when both are
    /// `None`, and [`ScheduleError::UnsupportedFrequency`] when the name is
    /// not recognised.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use paycheck_core::calculations::{PaycheckSchedule, ScheduleError};
    ///
    /// let first = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
    ///
    /// assert_eq!(
    ///     PaycheckSchedule::new(first, None, None),
    ///     Err(ScheduleError::MissingFrequencyOrCount)
    /// );
    /// assert!(PaycheckSchedule::new(first, Some("fortnightly"), None).is_err());
    /// assert!(PaycheckSchedule::new(first, Some("monthly"), None).is_ok());
    /// ```
    pub fn new(
        first_paycheck_date: NaiveDate,
        frequency: Option<&str>,
        paycheck_count: Option<u32>,
    ) -> Result<Self, ScheduleError> {
        let frequency = frequency.map(str::parse::<PayFrequency>).transpose()?;
        if frequency.is_none() && paycheck_count.is_none() {
            return Err(ScheduleError::MissingFrequencyOrCount);
        }

        Ok(Self {
            first_paycheck_date,
            frequency,
            paycheck_count,
        })
    }

    /// A schedule that repeats at `frequency` until the year ends.
    pub fn with_frequency(
        first_paycheck_date: NaiveDate,
        frequency: PayFrequency,
    ) -> Self {
        Self {
            first_paycheck_date,
            frequency: Some(frequency),
            paycheck_count: None,
        }
    }

    /// A schedule defined only by a paycheck count.
    pub fn with_count(
        first_paycheck_date: NaiveDate,
        paycheck_count: u32,
    ) -> Self {
        Self {
            first_paycheck_date,
            frequency: None,
            paycheck_count: Some(paycheck_count),
        }
    }

    /// Caps a frequency-based schedule at `paycheck_count` dates.
    pub fn limited_to(
        mut self,
        paycheck_count: u32,
    ) -> Self {
        self.paycheck_count = Some(paycheck_count);
        self
    }

    pub fn first_paycheck_date(&self) -> NaiveDate {
        self.first_paycheck_date
    }

    pub fn frequency(&self) -> Option<PayFrequency> {
        self.frequency
    }

    pub fn paycheck_count(&self) -> Option<u32> {
        self.paycheck_count
    }

    /// Days between paychecks; zero for count-only schedules.
    pub fn increment_days(&self) -> u64 {
        self.frequency.map_or(0, PayFrequency::increment_days)
    }

    /// Paycheck dates that fall in `year`, in order.
    ///
    /// The sequence stops at the first date outside `year` or once
    /// `paycheck_count` dates have been produced. Each call starts over from
    /// the first paycheck date.
    pub fn dates_for_year(
        &self,
        year: i32,
    ) -> PaycheckDates {
        PaycheckDates {
            next: Some(self.first_paycheck_date),
            year,
            increment_days: self.increment_days(),
            remaining: self.paycheck_count,
        }
    }
}

/// Lazy iterator over a schedule's dates. See [`PaycheckSchedule::dates_for_year`].
#[derive(Debug, Clone)]
pub struct PaycheckDates {
    next: Option<NaiveDate>,
    year: i32,
    increment_days: u64,
    remaining: Option<u32>,
}

impl Iterator for PaycheckDates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next.take()?;
        if current.year() != self.year {
            return None;
        }

        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }

        // A zero increment would revisit the same date forever.
        if self.increment_days > 0 {
            self.next = current.checked_add_days(Days::new(self.increment_days));
        }

        Some(current)
    }
}

impl FusedIterator for PaycheckDates {}
