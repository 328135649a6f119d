//! Publish pipeline orchestration
//!
//! Stage order: select → validate (gate) → archive → stage → import →
//! move → ingest → clean → finalize. Everything before the move phase is
//! all-or-nothing: a failure there aborts with nothing irreversible done.
//! From the move phase onward failures are per-SPU and reported in the
//! response instead of aborting.

use std::io;
use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use super::ingest::{MediaIngest, MediaIngestError};
use super::types::{ImageIssue, PublishResponse, Selection, StagedCounts};
use super::{archive, cleanup, finalize, images, import, mover, selector, staging};
use crate::config::PipelineConfig;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("No draft products matched the request")]
    NoDraftsFound,

    #[error("Image validation failed for {} SPU(s)", .0.len())]
    ImageValidationFailed(Vec<ImageIssue>),

    #[error("Staging write failed: {0}")]
    StagingWriteFailed(#[source] sqlx::Error),

    #[error("Import procedure {procedure} failed: {source}")]
    ImportProcedureFailed {
        procedure: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Media ingest failed: {0}")]
    MediaIngestFailed(#[from] MediaIngestError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Filesystem error: {0}")]
    Io(#[from] io::Error),
}

/// One publish run over a batch of draft SPUs.
pub struct PublishPipeline {
    pool: PgPool,
    config: PipelineConfig,
    ingest: Arc<dyn MediaIngest>,
}

impl PublishPipeline {
    pub fn new(pool: PgPool, config: PipelineConfig, ingest: Arc<dyn MediaIngest>) -> Self {
        Self {
            pool,
            config,
            ingest,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn run(&self, selection: &Selection) -> Result<PublishResponse, PublishError> {
        let set = selector::load_drafts(&self.pool, selection).await?;
        let spus = set.spus();
        tracing::info!(spus = spus.len(), "Publish run started");

        // Hard gate: one bad folder anywhere aborts before any mutation
        // beyond filename normalization.
        let draft_root = self.config.draft_image_root.clone();
        let products = set.products.clone();
        let (validated, issues) =
            tokio::task::spawn_blocking(move || images::validate_products(&draft_root, &products))
                .await
                .map_err(io::Error::other)??;
        if !issues.is_empty() {
            tracing::warn!(issues = issues.len(), "Publish run rejected by image gate");
            return Err(PublishError::ImageValidationFailed(issues));
        }

        let archived = archive::archive_run_folders(&validated, &self.config.archive_root).await;

        let (spu_rows, sku_rows) = staging::build_rows(&set);
        staging::replace_rows(
            &self.pool,
            &spus,
            &spu_rows,
            &sku_rows,
            self.config.staging_batch_size,
        )
        .await?;

        import::run_import(&self.pool, &spus).await?;

        // First irreversible stage; everything below is best-effort.
        let moved = mover::move_all(
            &validated,
            &self.config.live_image_root,
            self.config.move_concurrency,
        )
        .await;

        // An ingest failure here leaves already-moved folders in the live
        // tree while the draft rows keep status=draft.
        self.ingest
            .ingest(
                &spus,
                &self.config.draft_image_root,
                &self.config.live_image_root,
            )
            .await?;

        cleanup::clean_run_folders(&validated, &moved).await;

        // Covers all requested SPUs, including any whose move failed.
        finalize::mark_published(&self.pool, &spus).await?;

        tracing::info!(
            spus = spus.len(),
            moved = moved.iter().filter(|m| m.moved).count(),
            "Publish run finished"
        );

        Ok(PublishResponse {
            ok: true,
            spus,
            staged: StagedCounts {
                spus: spu_rows.len(),
                skus: sku_rows.len(),
            },
            moved,
            archived,
        })
    }
}
