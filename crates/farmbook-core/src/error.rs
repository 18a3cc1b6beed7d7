//! Record error types.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::RecordId;

/// Error returned when a record is malformed or breaks a collection invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A ledger line carries both a debit and a credit.
    #[error("record {id}: both debit and credit are present")]
    BothLegs {
        /// The offending record.
        id: RecordId,
    },
    /// A ledger line carries neither a debit nor a credit.
    #[error("record {id}: neither debit nor credit is present")]
    MissingLeg {
        /// The offending record.
        id: RecordId,
    },
    /// The record date could not be read.
    #[error("record {id}: unrecognised date {value:?}")]
    InvalidDate {
        /// The offending record.
        id: RecordId,
        /// The raw date text.
        value: String,
    },
    /// Two records in one collection share an id.
    #[error("duplicate record id {0}")]
    DuplicateId(RecordId),
    /// A field that must be non-negative holds a negative number.
    #[error("record {id}: {field} is negative ({value})")]
    NegativeValue {
        /// The offending record.
        id: RecordId,
        /// Field name.
        field: &'static str,
        /// The negative value.
        value: Decimal,
    },
}
