//! Store-side import procedures
//!
//! Two procedures own the staging-to-live upsert. Both are atomic and
//! idempotent for a given SPU list, so the pipeline treats them as black
//! boxes: call, check, abort on failure (no filesystem mutation has happened
//! yet when this stage runs).

use sqlx::PgPool;

use super::pipeline::PublishError;

const IMPORT_SPU_PROCEDURE: &str = "process_import_spu";
const IMPORT_SKU_PROCEDURE: &str = "process_import_sku";

/// Upsert staged rows into the live tables for the given SPUs.
pub async fn run_import(pool: &PgPool, spus: &[String]) -> Result<(), PublishError> {
    sqlx::query("CALL process_import_spu($1)")
        .bind(spus)
        .execute(pool)
        .await
        .map_err(|source| PublishError::ImportProcedureFailed {
            procedure: IMPORT_SPU_PROCEDURE,
            source,
        })?;
    tracing::debug!(procedure = IMPORT_SPU_PROCEDURE, spus = spus.len(), "Import procedure completed");

    sqlx::query("CALL process_import_sku($1)")
        .bind(spus)
        .execute(pool)
        .await
        .map_err(|source| PublishError::ImportProcedureFailed {
            procedure: IMPORT_SKU_PROCEDURE,
            source,
        })?;
    tracing::debug!(procedure = IMPORT_SKU_PROCEDURE, spus = spus.len(), "Import procedure completed");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn stage_spu(pool: &PgPool, spu: &str, title: &str) {
        sqlx::query("INSERT INTO staging_spus (spu, title) VALUES ($1, $2)")
            .bind(spu)
            .bind(title)
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO staging_skus (spu, sku, price) VALUES ($1, $2, $3)")
            .bind(spu)
            .bind(format!("{spu}-S"))
            .bind(9.99_f64)
            .execute(pool)
            .await
            .unwrap();
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_upserts_staged_rows_into_live_tables(pool: PgPool) {
        stage_spu(&pool, "AB100", "Lamp").await;
        stage_spu(&pool, "CD200", "Chair").await;
        stage_spu(&pool, "EF300", "Not requested").await;

        run_import(&pool, &["AB100".into(), "CD200".into()])
            .await
            .unwrap();

        let live: Vec<String> =
            sqlx::query_scalar("SELECT spu FROM live_products ORDER BY spu")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(live, vec!["AB100", "CD200"]);

        let skus: i64 = sqlx::query_scalar("SELECT count(*) FROM live_variants")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(skus, 2);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn rerunning_import_updates_instead_of_duplicating(pool: PgPool) {
        stage_spu(&pool, "AB100", "Lamp").await;
        run_import(&pool, &["AB100".into()]).await.unwrap();

        sqlx::query("UPDATE staging_spus SET title = $1 WHERE spu = $2")
            .bind("Renamed lamp")
            .bind("AB100")
            .execute(&pool)
            .await
            .unwrap();
        run_import(&pool, &["AB100".into()]).await.unwrap();

        let titles: Vec<Option<String>> =
            sqlx::query_scalar("SELECT title FROM live_products WHERE spu = $1")
                .bind("AB100")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(titles, vec![Some("Renamed lamp".to_string())]);
    }
}
