//! Draft catalog publish pipeline
//!
//! Nine stages, run strictly in order by [`pipeline::PublishPipeline`]:
//! selection, image validation, archiving, staging load, store import,
//! folder moves, media ingest, run folder cleanup, status finalization.

pub mod archive;
pub mod cleanup;
pub mod finalize;
pub mod images;
pub mod import;
pub mod ingest;
pub mod mover;
pub mod pipeline;
pub mod routes;
pub mod selector;
pub mod staging;
pub mod types;

pub use ingest::{MediaIngest, ScriptMediaIngest};
pub use pipeline::{PublishError, PublishPipeline};
pub use routes::publish_routes;
pub use types::{PublishRequest, PublishResponse};
