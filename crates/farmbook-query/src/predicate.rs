//! Predicate builder.
//!
//! Compiles the search text, named filters and date window of a
//! [`QuerySpec`] into one [`Predicate`] over records. The three parts are
//! ANDed. A record missing a field referenced by a part simply fails that
//! part; it never causes an error.

use std::ops::RangeInclusive;

use chrono::NaiveDate;
use farmbook_core::Record;

use crate::error::QueryError;
use crate::schema::Schema;
use crate::spec::QuerySpec;

/// A compiled record filter.
#[derive(Debug, Clone)]
pub struct Predicate<'s> {
    /// Lower-cased search text, `None` when the search box is empty.
    needle: Option<String>,
    search_fields: Vec<&'s str>,
    /// Active `(dimension, value)` pairs.
    filters: Vec<(&'s str, &'s str)>,
    window: Option<RangeInclusive<NaiveDate>>,
}

impl<'s> Predicate<'s> {
    /// Compile a predicate, resolving the date window against `today`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidQuerySpec`] if a filter names a dimension
    /// that is not declared, or not declared filterable, in the schema. This
    /// applies to `"all"` selections too.
    pub fn compile(
        schema: &'s Schema,
        spec: &'s QuerySpec,
        today: NaiveDate,
    ) -> Result<Self, QueryError> {
        for dimension in spec.filters.keys() {
            let field = format!("filters.{dimension}");
            match schema.field(dimension) {
                None => {
                    return Err(QueryError::invalid_spec(
                        field,
                        format!("unknown dimension for schema {}", schema.name),
                    ));
                }
                Some(def) if !def.filterable => {
                    return Err(QueryError::invalid_spec(
                        field,
                        "field is not a filter dimension",
                    ));
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            needle: (!spec.search_text.is_empty()).then(|| spec.search_text.to_lowercase()),
            search_fields: schema.search_fields().collect(),
            filters: spec.active_filters().collect(),
            window: spec.date_range.resolve(today),
        })
    }

    /// Whether the record passes every part of the predicate.
    pub fn matches(&self, record: &Record) -> bool {
        self.matches_window(record) && self.matches_filters(record) && self.matches_search(record)
    }

    /// Any searchable field contains the search text, ignoring case.
    fn matches_search(&self, record: &Record) -> bool {
        let Some(needle) = &self.needle else {
            return true;
        };
        self.search_fields.iter().any(|field| {
            record
                .get(field)
                .is_some_and(|value| value.as_text().to_lowercase().contains(needle.as_str()))
        })
    }

    /// Every active dimension equals its selected value exactly.
    fn matches_filters(&self, record: &Record) -> bool {
        self.filters.iter().all(|(dimension, expected)| {
            record
                .get(dimension)
                .is_some_and(|value| value.as_text() == *expected)
        })
    }

    fn matches_window(&self, record: &Record) -> bool {
        self.window
            .as_ref()
            .map_or(true, |window| window.contains(&record.date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{DateRange, Selection};
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn today() -> NaiveDate {
        date(2024, 3, 31)
    }

    fn feed_purchase() -> Record {
        Record::new("1", date(2024, 3, 20), "Monthly feed purchase")
            .with_reference("PV-104")
            .with_account("Feed Expense")
            .with_debit(dec!(620))
    }

    fn vet_bill() -> Record {
        Record::new("2", date(2023, 11, 2), "Veterinary services")
            .with_account("Vet Expense")
            .with_debit(dec!(150))
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let schema = Schema::general_ledger();
        let spec = QuerySpec::new().search("FEED");
        let predicate = Predicate::compile(&schema, &spec, today()).unwrap();

        assert!(predicate.matches(&feed_purchase()));
        assert!(!predicate.matches(&vet_bill()));
    }

    #[test]
    fn test_search_reaches_every_searchable_field() {
        let schema = Schema::general_ledger();
        let spec = QuerySpec::new().search("pv-10");
        let predicate = Predicate::compile(&schema, &spec, today()).unwrap();
        assert!(predicate.matches(&feed_purchase()));

        // `debit` is not searchable
        let spec = QuerySpec::new().search("620");
        let predicate = Predicate::compile(&schema, &spec, today()).unwrap();
        assert!(!predicate.matches(&feed_purchase()));
    }

    #[test]
    fn test_empty_search_matches_everything() {
        let schema = Schema::general_ledger();
        let spec = QuerySpec::new();
        let predicate = Predicate::compile(&schema, &spec, today()).unwrap();
        assert!(predicate.matches(&feed_purchase()));
        assert!(predicate.matches(&vet_bill()));
    }

    #[test]
    fn test_filters_are_exact_and_conjunctive() {
        let schema = Schema::general_ledger();
        let spec = QuerySpec::new()
            .filter("account", "Feed Expense")
            .filter("reference", "PV-104");
        let predicate = Predicate::compile(&schema, &spec, today()).unwrap();
        assert!(predicate.matches(&feed_purchase()));

        let spec = QuerySpec::new()
            .filter("account", "Feed")
            .filter("reference", Selection::All);
        let predicate = Predicate::compile(&schema, &spec, today()).unwrap();
        assert!(!predicate.matches(&feed_purchase()));
    }

    #[test]
    fn test_missing_field_is_a_non_match() {
        let schema = Schema::general_ledger();
        let spec = QuerySpec::new().filter("reference", "PV-104");
        let predicate = Predicate::compile(&schema, &spec, today()).unwrap();
        assert!(!predicate.matches(&vet_bill()));
    }

    #[test]
    fn test_date_window() {
        let schema = Schema::general_ledger();
        let spec = QuerySpec::new().date_range(DateRange::Last30Days);
        let predicate = Predicate::compile(&schema, &spec, today()).unwrap();
        assert!(predicate.matches(&feed_purchase()));
        assert!(!predicate.matches(&vet_bill()));

        let future = Record::new("3", date(2024, 4, 2), "Post-dated").with_credit(dec!(1));
        assert!(!predicate.matches(&future));
    }

    #[test]
    fn test_rejects_unknown_or_unfilterable_dimension() {
        let schema = Schema::general_ledger();

        let spec = QuerySpec::new().filter("supplier", Selection::All);
        let err = Predicate::compile(&schema, &spec, today()).unwrap_err();
        assert!(
            matches!(err, QueryError::InvalidQuerySpec { ref field, .. } if field == "filters.supplier")
        );

        let spec = QuerySpec::new().filter("debit", "620");
        let err = Predicate::compile(&schema, &spec, today()).unwrap_err();
        assert!(
            matches!(err, QueryError::InvalidQuerySpec { ref field, .. } if field == "filters.debit")
        );
    }
}
