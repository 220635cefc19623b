// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Natural-language date resolution for tool arguments.
//!
//! The API client itself only accepts already-resolved calendar dates;
//! this module is the thin layer in front of it that turns "yesterday"
//! or "last week" into a concrete `NaiveDate` before dispatch.

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate};

use crate::client::{DateRange, DatetimeRange};

/// Resolve a date argument to a calendar date.
///
/// Accepts `YYYY-MM-DD` or one of: `today`, `yesterday`, `last week`
/// (7 days ago), `last month` (30 days ago).
pub fn resolve_date(input: &str) -> Result<NaiveDate> {
    let today = Local::now().date_naive();

    let normalized = input.trim().to_lowercase();
    match normalized.as_str() {
        "" | "today" => Ok(today),
        "yesterday" => Ok(today - Duration::days(1)),
        s if s.starts_with("last week") => Ok(today - Duration::days(7)),
        s if s.starts_with("last month") => Ok(today - Duration::days(30)),
        s => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => Ok(date),
            Err(_) => bail!(
                "Invalid date '{input}': expected YYYY-MM-DD or one of \
                 'today', 'yesterday', 'last week', 'last month'"
            ),
        },
    }
}

/// Resolve a pair of date arguments into a [`DateRange`].
///
/// An absent (or blank) start date defaults to seven days ago, so a tool
/// call with no arguments covers the last week of data.
pub fn resolve_range(start: Option<&str>, end: Option<&str>) -> Result<DateRange> {
    let start_date = match start {
        Some(value) if !value.trim().is_empty() => resolve_date(value)?,
        _ => Local::now().date_naive() - Duration::days(7),
    };
    let end_date = end.map(resolve_date).transpose()?;
    Ok(DateRange::new(start_date, end_date))
}

/// Resolve a pair of RFC 3339 timestamp arguments into a
/// [`DatetimeRange`]. Unlike dates these carry an explicit offset and
/// accept no natural-language forms.
pub fn resolve_datetime_range(start: &str, end: Option<&str>) -> Result<DatetimeRange> {
    let start_datetime = parse_datetime(start)?;
    let end_datetime = match end {
        Some(value) => Some(parse_datetime(value)?),
        None => None,
    };
    Ok(DatetimeRange::new(start_datetime, end_datetime))
}

fn parse_datetime(input: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(input.trim()).map_err(|_| {
        anyhow::anyhow!("Invalid datetime '{input}': expected RFC 3339 with offset")
    })
}
