//! Core types for farmbook
//!
//! This crate provides the record model shared by the farmbook query engine:
//!
//! - [`Record`] - One ledger line or analytics observation
//! - [`Entry`] - The debit or credit leg of a ledger line
//! - [`Attribute`] - A screen-specific extra field
//! - [`FieldValue`] - A field read by name, with number/date/text coercions
//! - [`validate_records`] / [`validate_ledger`] - Collection invariant checks
//!
//! # Example
//!
//! ```
//! use farmbook_core::{NaiveDate, Record, validate_ledger};
//! use rust_decimal_macros::dec;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
//! let journal = vec![
//!     Record::new("1", date, "Heifer purchase")
//!         .with_reference("JV-1")
//!         .with_account("Livestock")
//!         .with_debit(dec!(500)),
//!     Record::new("2", date, "Heifer purchase")
//!         .with_reference("JV-1")
//!         .with_account("Bank")
//!         .with_credit(dec!(500)),
//! ];
//!
//! assert!(validate_ledger(&journal).is_ok());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod record;
pub mod validate;
pub mod value;

pub use error::RecordError;
pub use record::{Attribute, Attributes, Entry, Record, RecordId};
pub use validate::{validate_ledger, validate_records};
pub use value::{parse_date, parse_number, FieldValue};

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
