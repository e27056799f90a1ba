/// Short display forms for API dates.
///
/// Dates arrive either as `YYYY-MM-DD` or as ISO-8601 datetimes, with or
/// without an offset. Dates keep their calendar day; datetimes with an
/// offset are shown in local time, naive ones as given.
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

pub const INVALID_DATE: &str = "Invalid Date";

/// `2023-01-05` → `1/5/2023`.
pub fn short_date(raw: &str) -> String {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%-m/%-d/%Y").to_string();
    }
    match parse_datetime(raw) {
        Some(dt) => dt.format("%-m/%-d/%Y").to_string(),
        None => INVALID_DATE.to_string(),
    }
}

/// `2023-01-05T14:30:00` → `1/5/2023, 2:30:00 PM`.
pub fn short_datetime(raw: &str) -> String {
    let raw = raw.trim();

    if let Some(dt) = parse_datetime(raw) {
        return dt.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string();
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => format!("{}, 12:00:00 AM", date.format("%-m/%-d/%Y")),
        Err(_) => INVALID_DATE.to_string(),
    }
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
