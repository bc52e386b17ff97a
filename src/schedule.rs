//! Date and time fields.
//!
//! Stored form is `YYYY-MM-DD` / `HH:MM`. Typed input may also use the
//! display form `DD/MM/YYYY`.

use chrono::{NaiveDate, NaiveTime};

use crate::error::ValidationError;

const CANONICAL_DATE: &str = "%Y-%m-%d";
const DISPLAY_DATE: &str = "%d/%m/%Y";
const CANONICAL_TIME: &str = "%H:%M";

/// Normalize a date to `YYYY-MM-DD`. Blank input means "no date".
pub fn normalize_date(input: &str) -> Result<Option<String>, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input, CANONICAL_DATE)
        .or_else(|_| NaiveDate::parse_from_str(input, DISPLAY_DATE))
        .map(|d| Some(d.format(CANONICAL_DATE).to_string()))
        .map_err(|_| ValidationError::InvalidDate(input.to_string()))
}

/// Normalize a time to `HH:MM`. Blank input means "no time".
pub fn normalize_time(input: &str) -> Result<Option<String>, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(input, CANONICAL_TIME)
        .map(|t| Some(t.format(CANONICAL_TIME).to_string()))
        .map_err(|_| ValidationError::InvalidTime(input.to_string()))
}

/// `2025-10-12` → `12/10/2025`. Anything unparseable is returned unchanged.
pub fn display_date(canonical: &str) -> String {
    match NaiveDate::parse_from_str(canonical, CANONICAL_DATE) {
        Ok(d) => d.format(DISPLAY_DATE).to_string(),
        Err(_) => canonical.to_string(),
    }
}

pub(crate) fn normalize_date_opt(input: Option<String>) -> Result<Option<String>, ValidationError> {
    match input {
        Some(s) => normalize_date(&s),
        None => Ok(None),
    }
}

pub(crate) fn normalize_time_opt(input: Option<String>) -> Result<Option<String>, ValidationError> {
    match input {
        Some(s) => normalize_time(&s),
        None => Ok(None),
    }
}
