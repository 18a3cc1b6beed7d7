//! Query and aggregation engine for farmbook records.
//!
//! Every ledger and analytics screen shows the same thing: a collection of
//! records narrowed by free-text search, named filters and a date window,
//! ordered by a chosen field, and summarised by totals. This crate does that
//! once, driven by a per-screen [`Schema`].
//!
//! # Overview
//!
//! - [`Schema`] - Declared fields, their types and comparators
//! - [`QuerySpec`] - Search text, filter selections, date window, sort order
//! - [`Predicate`] - Compiled search, filter and window test
//! - [`SortPlan`] - Compiled, stable multi-key order
//! - [`Executor`] / [`query`] - The pipeline from records to an ordered view
//! - [`aggregate`] - Sums, group totals, period buckets and the balance check
//!
//! The engine never mutates its input and never reads the clock: relative
//! windows such as "last 7 days" are resolved against a `today` argument.
//!
//! # Example
//!
//! ```
//! use farmbook_core::{NaiveDate, Record};
//! use farmbook_query::{balance_check, query, QuerySpec, Schema, SortDirection};
//! use rust_decimal_macros::dec;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
//! let journal = vec![
//!     Record::new("1", today, "Dairy meal").with_account("Feed").with_debit(dec!(620)),
//!     Record::new("2", today, "Dairy meal").with_account("Bank").with_credit(dec!(600)),
//! ];
//!
//! let spec = QuerySpec::new().search("meal").sort_by("debit", SortDirection::Descending);
//! let rows = query(&Schema::general_ledger(), &journal, &spec, today).unwrap();
//! assert_eq!(rows[0].id.as_str(), "1");
//!
//! let check = balance_check(&rows);
//! assert!(!check.balanced);
//! assert_eq!(check.difference, dec!(20));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod error;
pub mod executor;
pub mod predicate;
pub mod schema;
pub mod sort;
pub mod spec;

pub use aggregate::{
    aggregate_groups, aggregate_periods, average_field, balance_check, count_by, count_present,
    group_by, group_by_period, sum_field, summarize, transaction_balances,
    unbalanced_transactions, Aggregator, BalanceCheck, FieldSummary, GroupKey, Period,
};
pub use error::QueryError;
pub use executor::{query, Executor, QueryResult};
pub use predicate::Predicate;
pub use schema::{FieldDef, FieldType, Schema};
pub use sort::SortPlan;
pub use spec::{DateRange, OrderSpec, QuerySpec, Selection, SortDirection};
