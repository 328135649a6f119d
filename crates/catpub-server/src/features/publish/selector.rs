//! Draft row selection
//!
//! Read-only first stage: resolves the requested SPU set into draft product
//! and variant rows. An empty product set aborts the run before anything
//! else happens.

use sqlx::PgPool;

use super::pipeline::PublishError;
use super::types::Selection;
use crate::db::{DraftProduct, DraftVariant, STATUS_DRAFT};

/// The target rows for a publish run.
#[derive(Debug, Clone)]
pub struct DraftSet {
    pub products: Vec<DraftProduct>,
    pub variants: Vec<DraftVariant>,
}

impl DraftSet {
    /// SPUs in product order, used for staging, imports and the response.
    pub fn spus(&self) -> Vec<String> {
        self.products.iter().map(|p| p.spu.clone()).collect()
    }

    /// Variants belonging to one product.
    pub fn variants_of<'a>(&'a self, spu: &'a str) -> impl Iterator<Item = &'a DraftVariant> + 'a {
        self.variants.iter().filter(move |v| v.spu == spu)
    }
}

const PRODUCT_COLUMNS: &str = "id, spu, title, subtitle, description, \
     bullets_short, bullets_medium, bullets_long, legacy_text_zh, \
     image_folder, raw_row, status, published_at";

const VARIANT_COLUMNS: &str = "id, spu, sku, \
     option1_en, option2_en, option3_en, option4_en, \
     option1_zh, option2_zh, option3_zh, option4_zh, \
     price, compare_at_price, cost, purchase_price, purchase_currency, \
     weight, weight_unit, shipping_class, hs_code, tax_code, customs_code, \
     supplier, image_urls, raw_row, status";

/// Load all draft rows matching the selection.
pub async fn load_drafts(pool: &PgPool, selection: &Selection) -> Result<DraftSet, PublishError> {
    let products: Vec<DraftProduct> = match selection {
        Selection::All => {
            sqlx::query_as(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM draft_products WHERE status = $1 ORDER BY spu"
            ))
            .bind(STATUS_DRAFT)
            .fetch_all(pool)
            .await?
        }
        Selection::Explicit(spus) => {
            sqlx::query_as(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM draft_products \
                 WHERE status = $1 AND spu = ANY($2) ORDER BY spu"
            ))
            .bind(STATUS_DRAFT)
            .bind(spus)
            .fetch_all(pool)
            .await?
        }
    };

    if products.is_empty() {
        return Err(PublishError::NoDraftsFound);
    }

    let spus = products.iter().map(|p| p.spu.clone()).collect::<Vec<_>>();
    let variants: Vec<DraftVariant> = sqlx::query_as(&format!(
        "SELECT {VARIANT_COLUMNS} FROM draft_variants \
         WHERE status = $1 AND spu = ANY($2) ORDER BY spu, sku"
    ))
    .bind(STATUS_DRAFT)
    .bind(&spus)
    .fetch_all(pool)
    .await?;

    tracing::debug!(
        products = products.len(),
        variants = variants.len(),
        "Draft rows selected"
    );

    Ok(DraftSet { products, variants })
}
