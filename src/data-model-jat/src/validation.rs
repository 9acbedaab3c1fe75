//! Field-level validation and the lenient deserializers used by request payloads.
//!
//! Shape checks (required fields, enumerated values, types) happen during deserialization.
//! Everything serde can't express (lengths, blank strings, URL format) goes through [`Validate`].

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

use crate::errors::ApiError;

/// Max length of `job_title`, `company`, `location` and `salary`.
pub const MAX_TEXT_LEN: usize = 255;
/// Max length of `job_url`.
pub const MAX_URL_LEN: usize = 500;
/// Years a stored DATE may fall in.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

/// A request payload that can check its own field constraints.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// Collects every failed field constraint so that one response reports all of them.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A required string must be non-blank and at most `max_len` characters once trimmed.
    pub fn required_text(&mut self, field: &str, value: &str, max_len: usize) -> &mut Self {
        let value = value.trim();
        if value.is_empty() {
            self.errors.push(format!("{} must not be blank", field));
        } else {
            self.text(field, value, Some(max_len));
        }
        self
    }

    /// An optional string, when present, must be at most `max_len` characters.
    pub fn optional_text(&mut self, field: &str, value: Option<&str>, max_len: usize) -> &mut Self {
        if let Some(value) = value {
            self.text(field, value, Some(max_len));
        }
        self
    }

    /// An optional string of unbounded length.
    pub fn optional_long_text(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.text(field, value, None);
        }
        self
    }

    /// An optional URL, when present, must be an absolute http(s) URL of at most [`MAX_URL_LEN`] characters.
    pub fn optional_url(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.text(field, value, Some(MAX_URL_LEN));
            match url::Url::parse(value) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                Ok(url) => self
                    .errors
                    .push(format!("{} must use http or https, not '{}'", field, url.scheme())),
                Err(e) => self.errors.push(format!("{} is not a valid URL: {}", field, e)),
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Ok if no constraint failed, otherwise a [`ApiError::Validation`] listing all failures.
    pub fn finish(&self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors.join("; ")))
        }
    }

    /// Text columns can't hold NUL, and some have a length cap.
    fn text(&mut self, field: &str, value: &str, max_len: Option<usize>) {
        if value.contains('\0') {
            self.errors.push(format!("{} must not contain NUL characters", field));
        }
        let len = value.chars().count();
        if let Some(max_len) = max_len
            && len > max_len
        {
            self.errors
                .push(format!("{} must be at most {} characters (got {})", field, max_len, len));
        }
    }
}

/// Parses a calendar date from `YYYY-MM-DD`, an RFC 3339 timestamp, or a naive ISO 8601 timestamp.
/// Only the date part of a timestamp is kept, and its year must be in [`YEAR_RANGE`].
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let s = s.trim();
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.date_naive()))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .map_err(|_| format!("invalid date '{}': expected YYYY-MM-DD or an ISO 8601 timestamp", s))?;
    if !YEAR_RANGE.contains(&date.year()) {
        return Err(format!(
            "invalid date '{}': year must be between {} and {}",
            s,
            YEAR_RANGE.start(),
            YEAR_RANGE.end()
        ));
    }
    Ok(date)
}

/// Salary may arrive as free text ("$120k - $140k") or as a JSON number.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSalary {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawSalary> for String {
    fn from(raw: RawSalary) -> Self {
        match raw {
            RawSalary::Text(text) => text,
            RawSalary::Number(number) => number.to_string(),
        }
    }
}

/// serde `deserialize_with` helpers.
pub mod de {
    use super::*;

    /// A required date in any format [`parse_date`] accepts.
    pub fn date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_date(&s).map_err(serde::de::Error::custom)
    }

    /// An optional date: `null` or missing is `None`.
    pub fn optional_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => parse_date(&s).map(Some).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }

    /// A clearable date for partial updates: missing is `None`, `null` is `Some(None)`.
    pub fn nullable_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error> {
        optional_date(deserializer).map(Some)
    }

    /// An optional salary given as a string or a number, stored as text.
    pub fn optional_salary<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<RawSalary>::deserialize(deserializer)?.map(String::from))
    }

    /// A clearable salary for partial updates.
    pub fn nullable_salary<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Option<String>>, D::Error> {
        optional_salary(deserializer).map(Some)
    }

    /// Any clearable value for partial updates: missing is `None`, `null` is `Some(None)`.
    pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
