//! Property-based tests for farmbook-core.
//!
//! Run with: cargo test -p farmbook-core --test `property_tests`

use chrono::NaiveDate;
use farmbook_core::{parse_number, validate_records, Record, RecordError};
use proptest::prelude::*;
use rust_decimal::Decimal;

// ============================================================================
// Arbitrary generators
// ============================================================================

fn arb_non_negative_decimal() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2026i32, 1u32..13u32, 1u32..29u32)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_leg() -> impl Strategy<Value = (bool, Decimal)> {
    (any::<bool>(), arb_non_negative_decimal())
}

fn arb_records() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec((arb_date(), arb_leg()), 0..30).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (date, (is_debit, amount)))| {
                let record = Record::new(i.to_string(), date, format!("line {i}"));
                if is_debit {
                    record.with_debit(amount)
                } else {
                    record.with_credit(amount)
                }
            })
            .collect()
    })
}

/// Render a non-negative decimal the way a screen would: currency prefix and
/// thousands separators.
fn render_currency(value: Decimal) -> String {
    let text = value.to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if frac_part.is_empty() {
        format!("KES {grouped}")
    } else {
        format!("KES {grouped}.{frac_part}")
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn well_formed_records_validate(records in arb_records()) {
        prop_assert!(validate_records(&records).is_ok());
    }

    #[test]
    fn duplicate_ids_are_always_reported(records in arb_records(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!records.is_empty());
        let mut records = records;
        let duplicate = records[pick.index(records.len())].clone();
        let id = duplicate.id.clone();
        records.push(duplicate);

        let errors = validate_records(&records).unwrap_err();
        prop_assert!(errors.contains(&RecordError::DuplicateId(id)));
    }

    #[test]
    fn currency_text_reads_back_as_the_same_number(value in arb_non_negative_decimal()) {
        prop_assert_eq!(parse_number(&render_currency(value)), Some(value));
    }

    #[test]
    fn both_legs_never_deserialize(debit in 0u32..100_000u32, credit in 0u32..100_000u32) {
        let json = format!(
            r#"{{"id": "1", "date": "2024-01-01", "debit": {debit}, "credit": {credit}}}"#
        );
        prop_assert!(serde_json::from_str::<Record>(&json).is_err());
    }
}
