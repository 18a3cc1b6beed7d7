//! Sort planner.
//!
//! Resolves the primary sort key and any `then_by` keys to their declared
//! types, then orders rows with a stable sort. Rows that tie on every key
//! keep their input order.

use std::cmp::Ordering;

use farmbook_core::Record;

use crate::error::QueryError;
use crate::schema::{FieldType, Schema};
use crate::spec::{QuerySpec, SortDirection};

#[derive(Debug, Clone, Copy)]
struct SortKey<'s> {
    field: &'s str,
    field_type: FieldType,
    direction: SortDirection,
}

/// A resolved, total order over records.
#[derive(Debug, Clone)]
pub struct SortPlan<'s> {
    keys: Vec<SortKey<'s>>,
}

impl<'s> SortPlan<'s> {
    /// Resolve the [`QuerySpec`] sort keys against the schema.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidQuerySpec`] naming `sortKey` or
    /// `thenBy.<key>` when a key is not declared in the schema.
    pub fn compile(schema: &'s Schema, spec: &'s QuerySpec) -> Result<Self, QueryError> {
        let mut keys = Vec::with_capacity(1 + spec.then_by.len());
        keys.push(resolve_key(
            schema,
            "sortKey",
            &spec.sort_key,
            spec.sort_direction,
        )?);
        for order in &spec.then_by {
            keys.push(resolve_key(
                schema,
                &format!("thenBy.{}", order.key),
                &order.key,
                order.direction,
            )?);
        }
        Ok(Self { keys })
    }

    /// Compare two records key by key.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for key in &self.keys {
            let ord = key
                .field_type
                .compare(a.get(key.field).as_ref(), b.get(key.field).as_ref());
            let ord = match key.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Sort rows in place. The sort is stable.
    pub fn sort(&self, rows: &mut [&Record]) {
        rows.sort_by(|a, b| self.compare(a, b));
    }
}

fn resolve_key<'s>(
    schema: &Schema,
    spec_field: &str,
    key: &'s str,
    direction: SortDirection,
) -> Result<SortKey<'s>, QueryError> {
    let field_type = schema.field_type(key).map_err(|_| {
        QueryError::invalid_spec(
            spec_field,
            format!("{key:?} is not a field of schema {}", schema.name),
        )
    })?;
    Ok(SortKey {
        field: key,
        field_type,
        direction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::OrderSpec;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn ledger() -> Vec<Record> {
        vec![
            Record::new("1", date(2024, 1, 3), "a").with_credit(dec!(100)),
            Record::new("2", date(2024, 1, 1), "b").with_debit(dec!(40)),
            Record::new("3", date(2024, 1, 2), "c").with_credit(dec!(25)),
            Record::new("4", date(2024, 1, 1), "d").with_debit(dec!(75)),
        ]
    }

    fn ids(rows: &[&Record]) -> Vec<String> {
        rows.iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn test_absent_numeric_sorts_as_zero_and_ties_keep_order() {
        let schema = Schema::general_ledger();
        let spec = QuerySpec::new().sort_by("debit", SortDirection::Ascending);
        let plan = SortPlan::compile(&schema, &spec).unwrap();

        let records = ledger();
        let mut rows: Vec<&Record> = records.iter().collect();
        plan.sort(&mut rows);
        // credit-only rows have no debit: both sort as 0, in input order
        assert_eq!(ids(&rows), vec!["1", "3", "2", "4"]);
    }

    #[test]
    fn test_descending_reverses_but_ties_stay_stable() {
        let schema = Schema::general_ledger();
        let spec = QuerySpec::new().sort_by("date", SortDirection::Descending);
        let plan = SortPlan::compile(&schema, &spec).unwrap();

        let records = ledger();
        let mut rows: Vec<&Record> = records.iter().collect();
        plan.sort(&mut rows);
        assert_eq!(ids(&rows), vec!["1", "3", "2", "4"]);
    }

    #[test]
    fn test_then_by_breaks_ties() {
        let schema = Schema::general_ledger();
        let spec = QuerySpec::new()
            .sort_by("date", SortDirection::Ascending)
            .then_by(OrderSpec::desc("debit"));
        let plan = SortPlan::compile(&schema, &spec).unwrap();

        let records = ledger();
        let mut rows: Vec<&Record> = records.iter().collect();
        plan.sort(&mut rows);
        assert_eq!(ids(&rows), vec!["4", "2", "3", "1"]);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let schema = Schema::general_ledger();

        let spec = QuerySpec::new().sort_by("weight", SortDirection::Ascending);
        let err = SortPlan::compile(&schema, &spec).unwrap_err();
        assert!(matches!(err, QueryError::InvalidQuerySpec { ref field, .. } if field == "sortKey"));

        let spec = QuerySpec::new().then_by(OrderSpec::asc("weight"));
        let err = SortPlan::compile(&schema, &spec).unwrap_err();
        assert!(
            matches!(err, QueryError::InvalidQuerySpec { ref field, .. } if field == "thenBy.weight")
        );
    }
}
