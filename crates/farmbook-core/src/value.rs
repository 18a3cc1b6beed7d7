//! Field values and the coercions applied to them.
//!
//! A [`FieldValue`] is what a [`Record`](crate::Record) yields when asked for
//! a field by name. The query engine never compares raw values directly: it
//! first coerces them to the declared type of the field (a number, a calendar
//! date, or case-folded text) using the helpers in this module.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Date layouts accepted for date-like strings, tried in order.
///
/// Slash-separated dates are read day-first.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Date-time layouts accepted when a string carries a time of day.
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A raw field value borrowed from a record.
///
/// # Examples
///
/// ```
/// use farmbook_core::FieldValue;
/// use rust_decimal_macros::dec;
///
/// let price = FieldValue::text("KES 1,250.50");
/// assert_eq!(price.to_number(), Some(dec!(1250.50)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// Free text, possibly holding a number or a date.
    Text(Cow<'a, str>),
    /// A decimal number.
    Number(Decimal),
    /// A calendar date.
    Date(NaiveDate),
}

impl<'a> FieldValue<'a> {
    /// Create a borrowed text value.
    #[must_use]
    pub const fn text(s: &'a str) -> Self {
        Self::Text(Cow::Borrowed(s))
    }

    /// Coerce to a number.
    ///
    /// Text is read as a currency-like number; dates never coerce.
    #[must_use]
    pub fn to_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => parse_number(s),
            Self::Date(_) => None,
        }
    }

    /// Coerce to a calendar date.
    #[must_use]
    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Text(s) => parse_date(s),
            Self::Number(_) => None,
        }
    }

    /// Render as text.
    ///
    /// Numbers are normalized (`100.00` renders as `100`) and dates use
    /// `YYYY-MM-DD`, so exact-match filters see one canonical spelling.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(s) => Cow::Borrowed(s.as_ref()),
            Self::Number(n) => Cow::Owned(n.normalize().to_string()),
            Self::Date(d) => Cow::Owned(d.to_string()),
        }
    }

    /// Detach the value from the record it was borrowed from.
    #[must_use]
    pub fn into_owned(self) -> FieldValue<'static> {
        match self {
            Self::Text(s) => FieldValue::Text(Cow::Owned(s.into_owned())),
            Self::Number(n) => FieldValue::Number(n),
            Self::Date(d) => FieldValue::Date(d),
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// Parse a currency-like number such as `"1,250.50"`, `"$ 40"` or `"KES -12"`.
///
/// Everything except ASCII digits, `.` and `-` is discarded before parsing.
/// Returns `None` when no digit is present or the remainder is not a number.
#[must_use]
pub fn parse_number(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
        .collect();
    if !cleaned.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Parse a date-like string to a calendar date.
///
/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DD[T ]HH:MM:SS[.f]`,
/// `YYYY-MM-DD`, `DD/MM/YYYY` and `YYYY/MM/DD`. Any time of day is dropped.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
}
