//! Catpub Server Library
//!
//! HTTP server that promotes draft catalog products into the live catalog.
//!
//! # Overview
//!
//! Draft products and variants arrive from spreadsheet imports (handled by
//! separate tooling) and sit in the `draft_*` tables with per-SPU image
//! folders under the draft image root. This server exposes the **publish
//! pipeline** that promotes a batch of draft SPUs to production:
//!
//! 1. select the target draft rows
//! 2. validate every SPU image folder (hard gate, nothing mutated on failure)
//! 3. archive the source run folders
//! 4. flatten drafts into staging rows
//! 5. run the store-side import procedures
//! 6. move image folders into the live tree
//! 7. invoke the external media ingest script
//! 8. clean up fully-drained run folders
//! 9. flip the draft rows to published
//!
//! Everything before the file moves is all-or-nothing; from the moves onward
//! failures are tracked per SPU and reported in the response.
//!
//! # Framework Stack
//!
//! - **Axum** for HTTP, **SQLx** (PostgreSQL) for the store
//! - **tracing** for structured logging, configured in `catpub-common`

pub mod api;
pub mod config;
pub mod db;
pub mod features;
pub mod middleware;
