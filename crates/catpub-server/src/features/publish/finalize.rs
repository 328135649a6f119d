//! Status finalization: flips draft rows to published
//!
//! Runs only after the ingest script has succeeded, and covers all
//! *requested* SPUs regardless of individual move outcomes. That asymmetry
//! is deliberate legacy behavior, preserved and documented rather than
//! patched; see DESIGN.md.

use sqlx::PgPool;

use super::pipeline::PublishError;
use crate::db::{STATUS_DRAFT, STATUS_PUBLISHED};

/// Mark all requested draft products and variants as published.
pub async fn mark_published(pool: &PgPool, spus: &[String]) -> Result<u64, PublishError> {
    let mut tx = pool.begin().await?;

    let products = sqlx::query(
        "UPDATE draft_products SET status = $1, published_at = now() \
         WHERE status = $2 AND spu = ANY($3)",
    )
    .bind(STATUS_PUBLISHED)
    .bind(STATUS_DRAFT)
    .bind(spus)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let variants = sqlx::query(
        "UPDATE draft_variants SET status = $1, published_at = now() \
         WHERE status = $2 AND spu = ANY($3)",
    )
    .bind(STATUS_PUBLISHED)
    .bind(STATUS_DRAFT)
    .bind(spus)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    tracing::info!(products, variants, "Draft rows marked published");
    Ok(products + variants)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn insert_draft(pool: &PgPool, spu: &str) {
        sqlx::query("INSERT INTO draft_products (spu) VALUES ($1)")
            .bind(spu)
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO draft_variants (spu, sku) VALUES ($1, $2)")
            .bind(spu)
            .bind(format!("{spu}-S"))
            .execute(pool)
            .await
            .unwrap();
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn requested_rows_flip_to_published_with_timestamp(pool: PgPool) {
        insert_draft(&pool, "AB100").await;
        insert_draft(&pool, "CD200").await;

        let affected = mark_published(&pool, &["AB100".into()]).await.unwrap();
        assert_eq!(affected, 2);

        let (status, published_at): (String, Option<chrono::DateTime<chrono::Utc>>) =
            sqlx::query_as("SELECT status, published_at FROM draft_products WHERE spu = $1")
                .bind("AB100")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(status, STATUS_PUBLISHED);
        assert!(published_at.is_some());

        let untouched: String =
            sqlx::query_scalar("SELECT status FROM draft_products WHERE spu = $1")
                .bind("CD200")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(untouched, STATUS_DRAFT);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn already_published_rows_are_not_touched_again(pool: PgPool) {
        insert_draft(&pool, "AB100").await;

        let first = mark_published(&pool, &["AB100".into()]).await.unwrap();
        assert_eq!(first, 2);
        let second = mark_published(&pool, &["AB100".into()]).await.unwrap();
        assert_eq!(second, 0);
    }
}
