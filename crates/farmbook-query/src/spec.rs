//! Query specification types.
//!
//! A [`QuerySpec`] is the view request a screen holds: search text, named
//! filter selections, a date window and the sort order. It is plain data,
//! built with defaults, changed as the user types and picks, and handed to
//! the [`Executor`](crate::Executor) on every change.
//!
//! # Example
//!
//! ```
//! use farmbook_query::{DateRange, OrderSpec, QuerySpec, SortDirection};
//!
//! let spec = QuerySpec::new()
//!     .search("feed")
//!     .filter("supplier", "Unga Farm Care")
//!     .date_range(DateRange::Last30Days)
//!     .sort_by("credit", SortDirection::Descending)
//!     .then_by(OrderSpec::asc("date"));
//!
//! assert_eq!(spec.active_filters().count(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use farmbook_core::parse_date;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// A filter selection for one dimension.
///
/// On the wire the token `"all"` is [`Selection::All`]; any other string is
/// an exact value to match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selection {
    /// No constraint on this dimension.
    #[default]
    All,
    /// The dimension must equal this value exactly.
    Only(String),
}

impl Selection {
    /// The selected value, or `None` for [`Selection::All`].
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(v) => Some(v),
        }
    }
}

impl From<String> for Selection {
    fn from(s: String) -> Self {
        if s == "all" {
            Self::All
        } else {
            Self::Only(s)
        }
    }
}

impl From<&str> for Selection {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Selection> for String {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::All => "all".to_string(),
            Selection::Only(v) => v,
        }
    }
}

/// Date window applied to a record's date, relative to a reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DateRange {
    /// No constraint.
    #[default]
    All,
    /// The reference day and the 7 days before it.
    Last7Days,
    /// The reference day and the 30 days before it.
    Last30Days,
    /// The reference day and the 90 days before it.
    Last90Days,
    /// January 1st of the reference day's year up to the reference day.
    ThisYear,
    /// An explicit inclusive window, written `YYYY-MM-DD..YYYY-MM-DD`.
    Between {
        /// First day included.
        from: NaiveDate,
        /// Last day included.
        to: NaiveDate,
    },
}

impl DateRange {
    /// Resolve the window against the reference day.
    ///
    /// Returns `None` for [`DateRange::All`].
    #[must_use]
    pub fn resolve(&self, today: NaiveDate) -> Option<RangeInclusive<NaiveDate>> {
        let days_back = |n: u64| today.checked_sub_days(Days::new(n)).unwrap_or(NaiveDate::MIN);
        match *self {
            Self::All => None,
            Self::Last7Days => Some(days_back(7)..=today),
            Self::Last30Days => Some(days_back(30)..=today),
            Self::Last90Days => Some(days_back(90)..=today),
            Self::ThisYear => Some(today.with_ordinal(1).unwrap_or(today)..=today),
            Self::Between { from, to } => Some(from..=to),
        }
    }
}

/// Tokens are case-sensitive: `all`, `last7days`, `last30days`, `last90days`,
/// `thisYear`, or `FROM..TO`.
impl FromStr for DateRange {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| QueryError::invalid_spec("dateRange", reason);
        match s {
            "all" => Ok(Self::All),
            "last7days" => Ok(Self::Last7Days),
            "last30days" => Ok(Self::Last30Days),
            "last90days" => Ok(Self::Last90Days),
            "thisYear" => Ok(Self::ThisYear),
            _ => {
                let Some((from, to)) = s.split_once("..") else {
                    return Err(invalid(format!("unknown range {s:?}")));
                };
                let from = parse_date(from)
                    .ok_or_else(|| invalid(format!("unrecognised start date {from:?}")))?;
                let to =
                    parse_date(to).ok_or_else(|| invalid(format!("unrecognised end date {to:?}")))?;
                if from > to {
                    return Err(invalid(format!("start {from} is after end {to}")));
                }
                Ok(Self::Between { from, to })
            }
        }
    }
}

impl TryFrom<String> for DateRange {
    type Error = QueryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Last7Days => f.write_str("last7days"),
            Self::Last30Days => f.write_str("last30days"),
            Self::Last90Days => f.write_str("last90days"),
            Self::ThisYear => f.write_str("thisYear"),
            Self::Between { from, to } => write!(f, "{from}..{to}"),
        }
    }
}

impl From<DateRange> for String {
    fn from(range: DateRange) -> Self {
        range.to_string()
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending (default).
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    /// Descending.
    #[serde(alias = "desc")]
    Descending,
}

impl FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(QueryError::invalid_spec(
                "sortDirection",
                format!("unknown direction {s:?}"),
            )),
        }
    }
}

/// A secondary sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Field to order by.
    pub key: String,
    /// Sort direction.
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderSpec {
    /// Create an ascending order spec.
    pub fn asc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Create a descending order spec.
    pub fn desc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// A view request: search, filters, date window and sort order.
///
/// The default spec has no search text, no filters, no date window and sorts
/// by `date`, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuerySpec {
    /// Case-insensitive substring; empty means no text filter.
    pub search_text: String,
    /// Filter selections keyed by dimension name.
    pub filters: BTreeMap<String, Selection>,
    /// Date window.
    pub date_range: DateRange,
    /// Primary sort field.
    pub sort_key: String,
    /// Primary sort direction.
    pub sort_direction: SortDirection,
    /// Secondary sort keys applied when the primary key ties.
    pub then_by: Vec<OrderSpec>,
    /// Maximum number of rows to return.
    pub limit: Option<usize>,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            filters: BTreeMap::new(),
            date_range: DateRange::All,
            sort_key: "date".to_string(),
            sort_direction: SortDirection::Descending,
            then_by: Vec::new(),
            limit: None,
        }
    }
}

impl QuerySpec {
    /// Create a spec with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search text.
    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    /// Set the selection for one filter dimension.
    #[must_use]
    pub fn filter(mut self, dimension: impl Into<String>, selection: impl Into<Selection>) -> Self {
        self.filters.insert(dimension.into(), selection.into());
        self
    }

    /// Set the date window.
    #[must_use]
    pub const fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    /// Set the primary sort key and direction.
    #[must_use]
    pub fn sort_by(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_key = key.into();
        self.sort_direction = direction;
        self
    }

    /// Append a secondary sort key.
    #[must_use]
    pub fn then_by(mut self, order: OrderSpec) -> Self {
        self.then_by.push(order);
        self
    }

    /// Set the row limit.
    #[must_use]
    pub const fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Filters that constrain the view, as `(dimension, value)` pairs.
    pub fn active_filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters
            .iter()
            .filter_map(|(dim, selection)| selection.value().map(|v| (dim.as_str(), v)))
    }
}
