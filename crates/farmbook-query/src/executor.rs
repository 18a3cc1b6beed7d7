//! Query pipeline.
//!
//! Filters a record collection with a [`Predicate`], orders the survivors
//! with a [`SortPlan`] and applies the optional row limit. The input slice is
//! never touched; the result borrows from it.

use chrono::NaiveDate;
use farmbook_core::Record;

use crate::error::QueryError;
use crate::predicate::Predicate;
use crate::schema::Schema;
use crate::sort::SortPlan;
use crate::spec::QuerySpec;

/// Ordered, filtered view over a record collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult<'r> {
    /// Matching records in view order, after the limit.
    pub rows: Vec<&'r Record>,
    /// Number of records that matched before the limit was applied.
    pub matched: usize,
}

impl<'r> QueryResult<'r> {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the limit dropped matching rows.
    pub fn is_truncated(&self) -> bool {
        self.matched > self.rows.len()
    }

    /// Iterate over the rows.
    pub fn iter(&self) -> impl Iterator<Item = &'r Record> + '_ {
        self.rows.iter().copied()
    }

    /// Take the rows.
    pub fn into_rows(self) -> Vec<&'r Record> {
        self.rows
    }
}

/// Query executor bound to one schema.
#[derive(Debug, Clone, Copy)]
pub struct Executor<'s> {
    schema: &'s Schema,
}

impl<'s> Executor<'s> {
    /// Create an executor for records described by `schema`.
    pub const fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    /// The schema this executor reads fields through.
    pub const fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Run a query.
    ///
    /// `today` is the reference day for relative date windows. The result
    /// depends only on the arguments, so equal inputs give equal outputs.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidQuerySpec`] if `spec` names a sort key
    /// or filter dimension the schema does not declare. It is checked
    /// before any record is read, so an empty collection still reports it.
    pub fn execute<'r, R: AsRef<Record>>(
        &self,
        records: &'r [R],
        spec: &QuerySpec,
        today: NaiveDate,
    ) -> Result<QueryResult<'r>, QueryError> {
        let predicate = Predicate::compile(self.schema, spec, today)?;
        let plan = SortPlan::compile(self.schema, spec)?;

        let mut rows: Vec<&Record> = records
            .iter()
            .map(AsRef::as_ref)
            .filter(|r| predicate.matches(r))
            .collect();
        plan.sort(&mut rows);

        let matched = rows.len();
        if let Some(limit) = spec.limit {
            rows.truncate(limit);
        }

        tracing::debug!(
            schema = %self.schema.name,
            records = records.len(),
            matched,
            returned = rows.len(),
            "query executed"
        );

        Ok(QueryResult { rows, matched })
    }
}

/// Filter and order `records` in one call.
///
/// `records` may be owned records or the rows of an earlier query.
///
/// Shorthand for [`Executor::execute`] that returns only the rows.
///
/// # Errors
///
/// See [`Executor::execute`].
///
/// # Example
///
/// ```
/// use farmbook_core::{NaiveDate, Record};
/// use farmbook_query::{query, QuerySpec, Schema};
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let records = vec![
///     Record::new("1", day, "Monthly feed purchase"),
///     Record::new("2", day, "Veterinary services"),
/// ];
///
/// let spec = QuerySpec::new().search("feed");
/// let rows = query(&Schema::general_ledger(), &records, &spec, day).unwrap();
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].description, "Monthly feed purchase");
/// ```
pub fn query<'r, R: AsRef<Record>>(
    schema: &Schema,
    records: &'r [R],
    spec: &QuerySpec,
    today: NaiveDate,
) -> Result<Vec<&'r Record>, QueryError> {
    Executor::new(schema)
        .execute(records, spec, today)
        .map(QueryResult::into_rows)
}
