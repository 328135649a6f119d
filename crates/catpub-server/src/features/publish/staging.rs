//! Staging loader: flattens draft rows into the import procedures' shape
//!
//! Staging rows are ephemeral: existing rows for the target SPU set are
//! deleted and rewritten on every run, in bounded batches to respect
//! statement size limits. Free text is cleaned of spreadsheet export
//! artifacts, brand/vendor fall back to the SPU prefix, and a product with
//! zero variants gets exactly one fallback SKU synthesized from its raw
//! imported row.

use sqlx::{PgPool, Postgres, QueryBuilder};

use super::pipeline::PublishError;
use super::selector::DraftSet;
use catpub_common::fields::{pick_f64, pick_str};
use catpub_common::text::{clean_opt, clean_text};
use crate::db::{DraftProduct, DraftVariant};

/// Delimiter used when joining multi-value fields into one staging column.
const LIST_DELIMITER: &str = ";";

/// Synonym keys tried, in order, when synthesizing a fallback SKU from the
/// raw spreadsheet row. Upstream column headers drift between imports.
const SKU_KEYS: &[&str] = &["sku", "seller sku", "sku code", "variant sku"];
const PRICE_KEYS: &[&str] = &["price", "sale price", "selling price"];
const COMPARE_AT_KEYS: &[&str] = &["compare at price", "compare-at price", "msrp", "list price"];
const COST_KEYS: &[&str] = &["cost", "unit cost", "cost per item"];
const PURCHASE_PRICE_KEYS: &[&str] = &["purchase price", "buy price", "rmb price"];
const PURCHASE_CURRENCY_KEYS: &[&str] = &["purchase currency", "currency"];
const WEIGHT_KEYS: &[&str] = &["weight", "weight (g)", "grams", "weight_g"];
const WEIGHT_UNIT_KEYS: &[&str] = &["weight unit", "weight_unit"];
const SUPPLIER_KEYS: &[&str] = &["supplier", "factory", "vendor"];
const IMAGE_URL_KEYS: &[&str] = &["image urls", "images", "image list", "image_urls"];

/// Flattened product row in the shape `process_import_spu` expects.
#[derive(Debug, Clone, PartialEq)]
pub struct StagingSpuRow {
    pub spu: String,
    pub title: Option<String>,
    pub brand: Option<String>,
    pub vendor: Option<String>,
    pub description: Option<String>,
    pub bullets_short: Option<String>,
    pub bullets_medium: Option<String>,
    pub bullets_long: Option<String>,
    pub legacy_text_zh: Option<String>,
    pub image_urls: Option<String>,
}

/// Flattened variant row in the shape `process_import_sku` expects.
#[derive(Debug, Clone, PartialEq)]
pub struct StagingSkuRow {
    pub spu: String,
    pub sku: String,
    pub option1_en: Option<String>,
    pub option2_en: Option<String>,
    pub option3_en: Option<String>,
    pub option4_en: Option<String>,
    pub option1_zh: Option<String>,
    pub option2_zh: Option<String>,
    pub option3_zh: Option<String>,
    pub option4_zh: Option<String>,
    pub price: Option<f64>,
    pub compare_at_price: Option<f64>,
    pub cost: Option<f64>,
    pub purchase_price: Option<f64>,
    pub purchase_currency: Option<String>,
    pub weight: Option<f64>,
    pub weight_unit: Option<String>,
    pub shipping_class: Option<String>,
    pub hs_code: Option<String>,
    pub tax_code: Option<String>,
    pub customs_code: Option<String>,
    pub supplier: Option<String>,
    pub image_urls: Option<String>,
}

/// Brand/vendor fallback: the SPU's leading two-letter prefix, uppercased.
fn spu_prefix(spu: &str) -> Option<String> {
    let prefix: String = spu
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .take(2)
        .collect();
    if prefix.len() == 2 {
        Some(prefix.to_ascii_uppercase())
    } else {
        None
    }
}

/// Normalize a multi-value field (comma/semicolon/newline separated) into
/// the single delimited staging string.
fn join_list(values: impl Iterator<Item = String>) -> Option<String> {
    let parts: Vec<String> = values
        .flat_map(|v| {
            v.split([',', ';', '\n'])
                .map(|s| s.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(LIST_DELIMITER))
    }
}

fn product_row(product: &DraftProduct) -> StagingSpuRow {
    let brand = pick_str(&product.raw_row, &["brand"])
        .map(|s| clean_text(&s))
        .or_else(|| spu_prefix(&product.spu));
    let vendor = pick_str(&product.raw_row, &["vendor", "store", "shop"])
        .map(|s| clean_text(&s))
        .or_else(|| spu_prefix(&product.spu));

    StagingSpuRow {
        spu: product.spu.clone(),
        title: clean_opt(product.title.as_deref()),
        brand,
        vendor,
        description: clean_opt(product.description.as_deref()),
        bullets_short: clean_opt(product.bullets_short.as_deref()),
        bullets_medium: clean_opt(product.bullets_medium.as_deref()),
        bullets_long: clean_opt(product.bullets_long.as_deref()),
        legacy_text_zh: clean_opt(product.legacy_text_zh.as_deref()),
        image_urls: pick_str(&product.raw_row, IMAGE_URL_KEYS)
            .and_then(|s| join_list(std::iter::once(s))),
    }
}

fn variant_row(variant: &DraftVariant) -> StagingSkuRow {
    StagingSkuRow {
        spu: variant.spu.clone(),
        sku: variant.sku.clone(),
        option1_en: clean_opt(variant.option1_en.as_deref()),
        option2_en: clean_opt(variant.option2_en.as_deref()),
        option3_en: clean_opt(variant.option3_en.as_deref()),
        option4_en: clean_opt(variant.option4_en.as_deref()),
        option1_zh: clean_opt(variant.option1_zh.as_deref()),
        option2_zh: clean_opt(variant.option2_zh.as_deref()),
        option3_zh: clean_opt(variant.option3_zh.as_deref()),
        option4_zh: clean_opt(variant.option4_zh.as_deref()),
        price: variant.price,
        compare_at_price: variant.compare_at_price,
        cost: variant.cost,
        purchase_price: variant.purchase_price,
        purchase_currency: clean_opt(variant.purchase_currency.as_deref()),
        weight: variant.weight,
        weight_unit: clean_opt(variant.weight_unit.as_deref()),
        shipping_class: clean_opt(variant.shipping_class.as_deref()),
        hs_code: clean_opt(variant.hs_code.as_deref()),
        tax_code: clean_opt(variant.tax_code.as_deref()),
        customs_code: clean_opt(variant.customs_code.as_deref()),
        supplier: clean_opt(variant.supplier.as_deref()),
        image_urls: join_list(variant.image_urls.iter().cloned()),
    }
}

/// Synthesize the single fallback SKU for a product with no variant rows,
/// pulling what the import spreadsheet had directly in the product row.
fn fallback_sku(product: &DraftProduct) -> StagingSkuRow {
    let raw = &product.raw_row;
    StagingSkuRow {
        spu: product.spu.clone(),
        sku: pick_str(raw, SKU_KEYS).unwrap_or_else(|| format!("{}-DEFAULT", product.spu)),
        option1_en: None,
        option2_en: None,
        option3_en: None,
        option4_en: None,
        option1_zh: None,
        option2_zh: None,
        option3_zh: None,
        option4_zh: None,
        price: pick_f64(raw, PRICE_KEYS),
        compare_at_price: pick_f64(raw, COMPARE_AT_KEYS),
        cost: pick_f64(raw, COST_KEYS),
        purchase_price: pick_f64(raw, PURCHASE_PRICE_KEYS),
        purchase_currency: pick_str(raw, PURCHASE_CURRENCY_KEYS),
        weight: pick_f64(raw, WEIGHT_KEYS),
        weight_unit: pick_str(raw, WEIGHT_UNIT_KEYS),
        shipping_class: None,
        hs_code: None,
        tax_code: None,
        customs_code: None,
        supplier: pick_str(raw, SUPPLIER_KEYS),
        image_urls: pick_str(raw, IMAGE_URL_KEYS).and_then(|s| join_list(std::iter::once(s))),
    }
}

/// Build staging rows for the whole draft set.
///
/// Every product yields exactly one SPU row; products without variants get
/// one synthesized fallback SKU so the published catalog never ends up with
/// an unsellable product.
pub fn build_rows(set: &DraftSet) -> (Vec<StagingSpuRow>, Vec<StagingSkuRow>) {
    let mut spu_rows = Vec::with_capacity(set.products.len());
    let mut sku_rows = Vec::new();

    for product in &set.products {
        spu_rows.push(product_row(product));
        let mut count = 0;
        for variant in set.variants_of(&product.spu) {
            sku_rows.push(variant_row(variant));
            count += 1;
        }
        if count == 0 {
            tracing::debug!(spu = %product.spu, "No variants, synthesizing fallback SKU");
            sku_rows.push(fallback_sku(product));
        }
    }

    (spu_rows, sku_rows)
}

/// Replace all staging rows for the SPU set: delete, then batched inserts,
/// in one transaction.
pub async fn replace_rows(
    pool: &PgPool,
    spus: &[String],
    spu_rows: &[StagingSpuRow],
    sku_rows: &[StagingSkuRow],
    batch_size: usize,
) -> Result<(), PublishError> {
    let batch_size = batch_size.max(1);
    let mut tx = pool.begin().await.map_err(PublishError::StagingWriteFailed)?;

    sqlx::query("DELETE FROM staging_spus WHERE spu = ANY($1)")
        .bind(spus)
        .execute(&mut *tx)
        .await
        .map_err(PublishError::StagingWriteFailed)?;
    sqlx::query("DELETE FROM staging_skus WHERE spu = ANY($1)")
        .bind(spus)
        .execute(&mut *tx)
        .await
        .map_err(PublishError::StagingWriteFailed)?;

    for chunk in spu_rows.chunks(batch_size) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO staging_spus (spu, title, brand, vendor, description, \
             bullets_short, bullets_medium, bullets_long, legacy_text_zh, image_urls) ",
        );
        builder.push_values(chunk, |mut b, row| {
            b.push_bind(row.spu.clone())
                .push_bind(row.title.clone())
                .push_bind(row.brand.clone())
                .push_bind(row.vendor.clone())
                .push_bind(row.description.clone())
                .push_bind(row.bullets_short.clone())
                .push_bind(row.bullets_medium.clone())
                .push_bind(row.bullets_long.clone())
                .push_bind(row.legacy_text_zh.clone())
                .push_bind(row.image_urls.clone());
        });
        builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(PublishError::StagingWriteFailed)?;
    }

    for chunk in sku_rows.chunks(batch_size) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO staging_skus (spu, sku, \
             option1_en, option2_en, option3_en, option4_en, \
             option1_zh, option2_zh, option3_zh, option4_zh, \
             price, compare_at_price, cost, purchase_price, purchase_currency, \
             weight, weight_unit, shipping_class, hs_code, tax_code, customs_code, \
             supplier, image_urls) ",
        );
        builder.push_values(chunk, |mut b, row| {
            b.push_bind(row.spu.clone())
                .push_bind(row.sku.clone())
                .push_bind(row.option1_en.clone())
                .push_bind(row.option2_en.clone())
                .push_bind(row.option3_en.clone())
                .push_bind(row.option4_en.clone())
                .push_bind(row.option1_zh.clone())
                .push_bind(row.option2_zh.clone())
                .push_bind(row.option3_zh.clone())
                .push_bind(row.option4_zh.clone())
                .push_bind(row.price)
                .push_bind(row.compare_at_price)
                .push_bind(row.cost)
                .push_bind(row.purchase_price)
                .push_bind(row.purchase_currency.clone())
                .push_bind(row.weight)
                .push_bind(row.weight_unit.clone())
                .push_bind(row.shipping_class.clone())
                .push_bind(row.hs_code.clone())
                .push_bind(row.tax_code.clone())
                .push_bind(row.customs_code.clone())
                .push_bind(row.supplier.clone())
                .push_bind(row.image_urls.clone());
        });
        builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(PublishError::StagingWriteFailed)?;
    }

    tx.commit().await.map_err(PublishError::StagingWriteFailed)?;

    tracing::info!(
        spus = spu_rows.len(),
        skus = sku_rows.len(),
        "Staging tables reloaded"
    );

    Ok(())
}
