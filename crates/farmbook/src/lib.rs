//! Farmbook CLI tools.
//!
//! This crate provides command-line access to the farmbook query engine:
//!
//! - `farmbook-query`: Search, filter, sort and total a JSON record file
//!
//! # Example Usage
//!
//! ```bash
//! farmbook-query journal.json --search feed --sort debit --desc
//! farmbook-query sales.json --schema sales --group-by buyer --sum amount
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
