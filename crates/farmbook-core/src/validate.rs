//! Collection-level record checks.
//!
//! Records arrive pre-formed from a collaborator, so nothing here runs on
//! construction. Callers that want to reject bad input before querying run
//! [`validate_records`] (or [`validate_ledger`] for journal screens); every
//! problem found is reported, not just the first.

use std::collections::HashSet;

use crate::error::RecordError;
use crate::record::Record;

/// Check id uniqueness and non-negative money and count fields.
///
/// # Errors
///
/// Returns every [`RecordError::DuplicateId`] and
/// [`RecordError::NegativeValue`] found, in input order.
pub fn validate_records<R: AsRef<Record>>(records: &[R]) -> Result<(), Vec<RecordError>> {
    let errors = collect_errors(records, false);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Like [`validate_records`], and additionally require every record to be
/// a debit or credit leg.
///
/// # Errors
///
/// Returns every error [`validate_records`] would, plus
/// [`RecordError::MissingLeg`] for records without an entry.
pub fn validate_ledger<R: AsRef<Record>>(records: &[R]) -> Result<(), Vec<RecordError>> {
    let errors = collect_errors(records, true);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_errors<R: AsRef<Record>>(records: &[R], ledger: bool) -> Vec<RecordError> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut errors = Vec::new();

    for record in records {
        let record = record.as_ref();
        if !seen.insert(record.id.as_str()) {
            errors.push(RecordError::DuplicateId(record.id.clone()));
        }
        if ledger && record.entry.is_none() {
            errors.push(RecordError::MissingLeg {
                id: record.id.clone(),
            });
        }

        let checked = [
            ("debit", record.debit()),
            ("credit", record.credit()),
            ("amount", record.amount),
            ("quantity", record.quantity),
            ("unitPrice", record.unit_price),
        ];
        for (field, value) in checked {
            if let Some(value) = value.filter(|v| v.is_sign_negative() && !v.is_zero()) {
                errors.push(RecordError::NegativeValue {
                    id: record.id.clone(),
                    field,
                    value,
                });
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    #[test]
    fn test_valid_ledger() {
        let records = vec![
            Record::new("1", date(), "Heifer").with_debit(dec!(500)),
            Record::new("2", date(), "Heifer").with_credit(dec!(500)),
        ];
        assert!(validate_ledger(&records).is_ok());
    }

    #[test]
    fn test_reports_every_problem() {
        let records = vec![
            Record::new("1", date(), "Feed").with_quantity(dec!(-2)),
            Record::new("1", date(), "Feed again"),
        ];
        let errors = validate_ledger(&records).unwrap_err();
        assert_eq!(
            errors,
            vec![
                RecordError::MissingLeg { id: "1".into() },
                RecordError::NegativeValue {
                    id: "1".into(),
                    field: "quantity",
                    value: dec!(-2),
                },
                RecordError::DuplicateId("1".into()),
                RecordError::MissingLeg { id: "1".into() },
            ]
        );
    }

    #[test]
    fn test_analytics_records_need_no_leg() {
        let records = [Record::new("1", date(), "Milk sale").with_amount(dec!(1200))];
        assert!(validate_records(&records).is_ok());
        assert!(validate_ledger(&records).is_err());
    }

    #[test]
    fn test_accepts_borrowed_views() {
        let records = [Record::new("1", date(), "Milk sale").with_amount(dec!(1200))];
        let view: Vec<&Record> = records.iter().collect();
        assert!(validate_records(&view).is_ok());
    }
}
