//! Feature modules
//!
//! Each feature owns its routes, types and stage logic; everything shared
//! across features lives in the [`FeatureState`] handed to the router.

use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::config::PipelineConfig;
use crate::features::publish::ingest::MediaIngest;

pub mod publish;

/// Shared state for all feature routers.
#[derive(Clone)]
pub struct FeatureState {
    pub db: PgPool,
    pub pipeline: PipelineConfig,
    pub media_ingest: Arc<dyn MediaIngest>,
    /// Held for the duration of a publish run; concurrent triggers get 409.
    pub publish_lock: Arc<Mutex<()>>,
}

impl FeatureState {
    pub fn new(db: PgPool, pipeline: PipelineConfig, media_ingest: Arc<dyn MediaIngest>) -> Self {
        Self {
            db,
            pipeline,
            media_ingest,
            publish_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// All feature routes, mounted under the API prefix.
pub fn routes() -> Router<FeatureState> {
    Router::new().nest("/publish", publish::publish_routes())
}
