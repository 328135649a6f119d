//! Catpub Common Library
//!
//! Shared utilities for the catalog publish workspace:
//!
//! - **Logging**: tracing initialization shared by all binaries
//! - **Fields**: schema-drift-tolerant lookups into imported spreadsheet rows
//! - **Text**: cleanup of free text carried over from spreadsheet exports

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod fields;
pub mod logging;
pub mod text;
