//! Aggregates over record views.
//!
//! Sums, counts and averages over numeric fields, grouped or not, and the
//! double-entry balance check. The free functions take any slice of records
//! or of record references, so they apply equally to a full collection and to
//! the rows of a [`QueryResult`](crate::QueryResult):
//!
//! ```
//! use farmbook_core::{NaiveDate, Record};
//! use farmbook_query::{balance_check, query, QuerySpec, Schema};
//! use rust_decimal_macros::dec;
//!
//! let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let journal = vec![
//!     Record::new("1", day, "Heifer").with_account("Livestock").with_debit(dec!(500)),
//!     Record::new("2", day, "Heifer").with_account("Bank").with_credit(dec!(500)),
//! ];
//!
//! let view = query(&Schema::general_ledger(), &journal, &QuerySpec::new(), day).unwrap();
//! let check = balance_check(&view);
//! assert!(check.balanced);
//! assert_eq!(check.debit_total, dec!(500));
//! ```
//!
//! Absent values contribute nothing: a credit leg adds zero to a debit sum.
//! Ratios such as cost per unit are left to the caller.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use farmbook_core::Record;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::schema::{FieldType, Schema};

/// Group key: the dimension value rendered as text, or `None` for records
/// that do not carry the dimension.
pub type GroupKey = Option<String>;

/// Result of the debit/credit balance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceCheck {
    /// Whether debits equal credits.
    pub balanced: bool,
    /// Sum of debit legs.
    pub debit_total: Decimal,
    /// Sum of credit legs.
    pub credit_total: Decimal,
    /// Absolute difference between the two totals.
    pub difference: Decimal,
}

impl BalanceCheck {
    /// Build a check from the two totals.
    ///
    /// The difference saturates at [`Decimal::MAX`].
    pub fn from_totals(debit_total: Decimal, credit_total: Decimal) -> Self {
        let difference = debit_total.saturating_sub(credit_total).abs();
        Self {
            balanced: difference.is_zero(),
            debit_total,
            credit_total,
            difference,
        }
    }
}

/// Count, sum, average and extremes of one numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FieldSummary {
    /// Records carrying the field.
    pub count: usize,
    /// Sum over those records.
    pub sum: Decimal,
    /// Mean over those records.
    pub average: Option<Decimal>,
    /// Smallest value.
    pub min: Option<Decimal>,
    /// Largest value.
    pub max: Option<Decimal>,
}

/// Calendar bucket for time-series grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// One calendar day.
    Day,
    /// ISO week starting Monday.
    Week,
    /// Calendar month.
    Month,
    /// Calendar quarter.
    Quarter,
    /// Calendar year.
    Year,
}

impl Period {
    /// First day of the bucket containing `date`.
    #[must_use]
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => {
                let offset = u64::from(date.weekday().num_days_from_monday());
                date.checked_sub_days(Days::new(offset)).unwrap_or(date)
            }
            Self::Month => date.with_day(1).unwrap_or(date),
            Self::Quarter => {
                let month = date.month0() / 3 * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
            }
            Self::Year => date.with_ordinal(1).unwrap_or(date),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        })
    }
}

impl FromStr for Period {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            _ => Err(QueryError::invalid_spec(
                "period",
                format!("unknown period {s:?}"),
            )),
        }
    }
}

fn number_of(record: &Record, field: &str) -> Option<Decimal> {
    record.get(field).and_then(|value| value.to_number())
}

/// Exact sum, or `None` if it does not fit in a [`Decimal`].
fn checked_sum<R: AsRef<Record>>(records: &[R], field: &str) -> Option<Decimal> {
    records
        .iter()
        .filter_map(|r| number_of(r.as_ref(), field))
        .try_fold(Decimal::ZERO, Decimal::checked_add)
}

/// Sum a numeric field over the records that carry it.
///
/// A sum beyond the range of [`Decimal`] saturates at [`Decimal::MAX`]
/// (or [`Decimal::MIN`]) instead of panicking.
pub fn sum_field<R: AsRef<Record>>(records: &[R], field: &str) -> Decimal {
    records
        .iter()
        .filter_map(|r| number_of(r.as_ref(), field))
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Number of records carrying a numeric value for `field`.
pub fn count_present<R: AsRef<Record>>(records: &[R], field: &str) -> usize {
    records
        .iter()
        .filter(|r| number_of(r.as_ref(), field).is_some())
        .count()
}

/// Mean of a numeric field over the records that carry it.
///
/// Returns `None` when no record carries the field.
pub fn average_field<R: AsRef<Record>>(records: &[R], field: &str) -> Option<Decimal> {
    summarize(records, field).average
}

/// Count, sum, mean, min and max of a numeric field in one pass.
pub fn summarize<R: AsRef<Record>>(records: &[R], field: &str) -> FieldSummary {
    let mut summary = FieldSummary::default();
    for value in records.iter().filter_map(|r| number_of(r.as_ref(), field)) {
        summary.count += 1;
        summary.sum = summary.sum.saturating_add(value);
        summary.min = Some(summary.min.map_or(value, |m| m.min(value)));
        summary.max = Some(summary.max.map_or(value, |m| m.max(value)));
    }
    if summary.count > 0 {
        summary.average = summary.sum.checked_div(Decimal::from(summary.count));
    }
    summary
}

/// Partition records by a dimension, keeping input order within each group.
pub fn group_by<'r, R: AsRef<Record>>(
    records: &'r [R],
    dimension: &str,
) -> BTreeMap<GroupKey, Vec<&'r Record>> {
    let mut groups: BTreeMap<GroupKey, Vec<&'r Record>> = BTreeMap::new();
    for record in records {
        let record = record.as_ref();
        let key = record
            .get(dimension)
            .map(|value| value.as_text().into_owned());
        groups.entry(key).or_default().push(record);
    }
    groups
}

/// Sum a numeric field per group of a dimension.
///
/// The group sums always add up to [`sum_field`] over the whole input.
pub fn aggregate_groups<R: AsRef<Record>>(
    records: &[R],
    dimension: &str,
    field: &str,
) -> BTreeMap<GroupKey, Decimal> {
    group_by(records, dimension)
        .into_iter()
        .map(|(key, rows)| (key, sum_field(&rows, field)))
        .collect()
}

/// Number of records per group of a dimension.
pub fn count_by<R: AsRef<Record>>(records: &[R], dimension: &str) -> BTreeMap<GroupKey, usize> {
    group_by(records, dimension)
        .into_iter()
        .map(|(key, rows)| (key, rows.len()))
        .collect()
}

/// Partition records by calendar bucket, keyed by the bucket's first day.
pub fn group_by_period<R: AsRef<Record>>(
    records: &[R],
    period: Period,
) -> BTreeMap<NaiveDate, Vec<&Record>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<&Record>> = BTreeMap::new();
    for record in records {
        let record = record.as_ref();
        buckets
            .entry(period.bucket_start(record.date))
            .or_default()
            .push(record);
    }
    buckets
}

/// Sum a numeric field per calendar bucket.
pub fn aggregate_periods<R: AsRef<Record>>(
    records: &[R],
    period: Period,
    field: &str,
) -> BTreeMap<NaiveDate, Decimal> {
    group_by_period(records, period)
        .into_iter()
        .map(|(start, rows)| (start, sum_field(&rows, field)))
        .collect()
}

/// Check that debits equal credits over the given view.
///
/// An empty view is balanced. An unbalanced result is information for the
/// caller to display, not an error. If either total overflows, the totals
/// saturate and the view is reported as unbalanced.
pub fn balance_check<R: AsRef<Record>>(records: &[R]) -> BalanceCheck {
    match (checked_sum(records, "debit"), checked_sum(records, "credit")) {
        (Some(debit_total), Some(credit_total)) => {
            BalanceCheck::from_totals(debit_total, credit_total)
        }
        _ => {
            tracing::debug!("balance totals overflow");
            BalanceCheck {
                balanced: false,
                ..BalanceCheck::from_totals(
                    sum_field(records, "debit"),
                    sum_field(records, "credit"),
                )
            }
        }
    }
}

/// Balance check per transaction reference.
///
/// Records without a reference are not part of any transaction and are
/// skipped.
pub fn transaction_balances<R: AsRef<Record>>(records: &[R]) -> BTreeMap<String, BalanceCheck> {
    group_by(records, "reference")
        .into_iter()
        .filter_map(|(key, rows)| key.map(|reference| (reference, balance_check(&rows))))
        .collect()
}

/// Transactions whose legs do not balance, keyed by reference.
pub fn unbalanced_transactions<R: AsRef<Record>>(
    records: &[R],
) -> BTreeMap<String, BalanceCheck> {
    let unbalanced: BTreeMap<_, _> = transaction_balances(records)
        .into_iter()
        .filter(|(_, check)| !check.balanced)
        .collect();
    if !unbalanced.is_empty() {
        tracing::debug!(count = unbalanced.len(), "unbalanced transactions in view");
    }
    unbalanced
}

/// Schema-checked aggregates.
///
/// Wraps the free functions so a misspelt field or dimension fails loudly
/// instead of summing to zero.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'s> {
    schema: &'s Schema,
}

impl<'s> Aggregator<'s> {
    /// Create an aggregator for records described by `schema`.
    pub const fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    fn numeric(&self, field: &str) -> Result<(), QueryError> {
        match self.schema.field_type(field)? {
            FieldType::Numeric => Ok(()),
            other => Err(QueryError::invalid_spec(
                field,
                format!("cannot aggregate a {other} field"),
            )),
        }
    }

    fn dimension(&self, dimension: &str) -> Result<(), QueryError> {
        self.schema.field_type(dimension).map(|_| ())
    }

    /// See [`sum_field`].
    ///
    /// # Errors
    ///
    /// [`QueryError::UnsupportedFieldType`] for an undeclared field,
    /// [`QueryError::InvalidQuerySpec`] for a non-numeric one.
    pub fn sum_field<R: AsRef<Record>>(&self, records: &[R], field: &str) -> Result<Decimal, QueryError> {
        self.numeric(field)?;
        Ok(sum_field(records, field))
    }

    /// See [`summarize`].
    ///
    /// # Errors
    ///
    /// Same as [`Aggregator::sum_field`].
    pub fn summarize<R: AsRef<Record>>(
        &self,
        records: &[R],
        field: &str,
    ) -> Result<FieldSummary, QueryError> {
        self.numeric(field)?;
        Ok(summarize(records, field))
    }

    /// See [`group_by`].
    ///
    /// # Errors
    ///
    /// [`QueryError::UnsupportedFieldType`] for an undeclared dimension.
    pub fn group_by<'r, R: AsRef<Record>>(
        &self,
        records: &'r [R],
        dimension: &str,
    ) -> Result<BTreeMap<GroupKey, Vec<&'r Record>>, QueryError> {
        self.dimension(dimension)?;
        Ok(group_by(records, dimension))
    }

    /// See [`aggregate_groups`].
    ///
    /// # Errors
    ///
    /// Any error of [`Aggregator::group_by`] or [`Aggregator::sum_field`].
    pub fn aggregate_groups<R: AsRef<Record>>(
        &self,
        records: &[R],
        dimension: &str,
        field: &str,
    ) -> Result<BTreeMap<GroupKey, Decimal>, QueryError> {
        self.dimension(dimension)?;
        self.numeric(field)?;
        Ok(aggregate_groups(records, dimension, field))
    }

    /// See [`aggregate_periods`].
    ///
    /// # Errors
    ///
    /// Same as [`Aggregator::sum_field`].
    pub fn aggregate_periods<R: AsRef<Record>>(
        &self,
        records: &[R],
        period: Period,
        field: &str,
    ) -> Result<BTreeMap<NaiveDate, Decimal>, QueryError> {
        self.numeric(field)?;
        Ok(aggregate_periods(records, period, field))
    }

    /// See [`balance_check`].
    ///
    /// # Errors
    ///
    /// Fails unless the schema declares numeric `debit` and `credit` fields.
    pub fn balance_check<R: AsRef<Record>>(&self, records: &[R]) -> Result<BalanceCheck, QueryError> {
        self.numeric("debit")?;
        self.numeric("credit")?;
        Ok(balance_check(records))
    }
}
