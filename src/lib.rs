//! # cutcheck
//!
//! A validation engine for Column Interface Definitions (CIDs): a
//! declarative, spreadsheet-friendly description of a tabular data file's
//! structure (data format, typed field formats, row/end-of-stream checks),
//! and a validating reader/writer that checks real data against one.
//!
//! The crate is a library only. A CID is loaded with
//! [`cid::build_cid_from_rows`] from rows produced by any of the
//! [`row::RowReader`] family (`delimited`, `fixed`, `excel`, `ods`), then
//! driven through [`validator::Reader`]/[`validator::Writer`] to validate
//! or write a data file against it. New field format and check kinds can
//! be registered with [`registry::Registry`] without touching the core.

pub mod checks;
pub mod cid;
pub mod data_format;
pub mod error;
pub mod field_format;
mod helpers;
pub mod range;
pub mod registry;
pub mod row;
pub mod validator;
