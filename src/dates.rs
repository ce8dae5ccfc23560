use crate::error::{PerfError, Result};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date string
pub fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|source| PerfError::InvalidDate {
        input: date.to_string(),
        source,
    })
}

/// Check whether a timestamp falls on the given calendar day.
///
/// The timestamp is normalised to UTC before its date is taken, so
/// `2025-06-17T01:30:00+02:00` is on `2025-06-16`.
pub fn is_on_date<Tz: TimeZone>(timestamp: &DateTime<Tz>, date: &str) -> Result<bool> {
    let target = parse_date(date)?;
    Ok(timestamp.with_timezone(&Utc).date_naive() == target)
}

/// Inclusive range of calendar days used in search queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    /// First day (also the day commits and reviews are matched against)
    pub from: NaiveDate,
    /// Last day
    pub to: NaiveDate,
}

impl DateRange {
    /// Create a range from two date strings
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        Self::new(parse_date(from)?, parse_date(to)?)
    }

    /// Create a range, rejecting an end before the start
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if to < from {
            return Err(PerfError::config(format!(
                "end date {} is before start date {}",
                to, from
            )));
        }
        Ok(Self { from, to })
    }

    /// A range starting on `from` and ending the next day
    pub fn single_day(from: NaiveDate) -> Self {
        Self {
            from,
            to: from + Duration::days(1),
        }
    }

    /// Today (UTC) through tomorrow
    pub fn today() -> Self {
        Self::single_day(Utc::now().date_naive())
    }

    /// Start date as `YYYY-MM-DD`
    pub fn start_str(&self) -> String {
        self.from.format(DATE_FORMAT).to_string()
    }

    /// End date as `YYYY-MM-DD`
    pub fn end_str(&self) -> String {
        self.to.format(DATE_FORMAT).to_string()
    }

    /// `from..to` as used in GitHub search qualifiers
    pub fn search_qualifier(&self) -> String {
        format!("{}..{}", self.start_str(), self.end_str())
    }
}
