//! Date conversion helpers.

use chrono::{NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::constants::{DAY_FIRST_DATE_FORMAT, ISO_DATE_FORMAT, LOCAL_TIME_ZONE, SOURCE_TIME_ZONE};
use crate::error::{DomainError, DomainResult};

fn zone(name: &str) -> DomainResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| DomainError::UnknownTimeZone(name.to_string()))
}

/// Convert a wall-clock time between two zones, going through UTC.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant; times
/// that fall into a DST gap are rejected.
pub fn convert_between_zones(value: NaiveDateTime, from: &str, to: &str) -> DomainResult<NaiveDateTime> {
    let source = zone(from)?;
    let target = zone(to)?;

    let utc = source
        .from_local_datetime(&value)
        .earliest()
        .ok_or_else(|| DomainError::NonexistentLocalTime(value.to_string(), from.to_string()))?
        .naive_utc();

    Ok(target.from_utc_datetime(&utc).naive_local())
}

/// Convert a US Eastern wall-clock time into Egypt local time.
pub fn convert_to_local_date(eastern: NaiveDateTime) -> DomainResult<NaiveDateTime> {
    convert_between_zones(eastern, SOURCE_TIME_ZONE, LOCAL_TIME_ZONE)
}

/// Parse a `dd-mm-yyyy` date. Blank input yields `None`.
pub fn parse_day_first_date(value: Option<&str>) -> DomainResult<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, DAY_FIRST_DATE_FORMAT)
            .map(Some)
            .map_err(|_| DomainError::validation(format!("Invalid date '{}', expected dd-mm-yyyy", raw))),
    }
}

/// Reformat a `dd-mm-yyyy` date as `yyyy-mm-dd`. Blank input yields `None`.
pub fn reformat_day_first_date(value: Option<&str>) -> DomainResult<Option<String>> {
    Ok(parse_day_first_date(value)?.map(|date| date.format(ISO_DATE_FORMAT).to_string()))
}
