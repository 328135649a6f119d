//! Database row models for the draft catalog tables
//!
//! Queries live with the pipeline stages that own them; this module only
//! defines the row shapes. All queries are runtime-checked (`sqlx::query_as`)
//! so the workspace builds without a live database.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Draft row status values.
pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_PUBLISHED: &str = "published";

/// A draft catalog product, keyed by its SPU (product-family identifier).
///
/// `raw_row` preserves the original spreadsheet record for audit and for
/// fallback lookups when a product has no variant rows.
#[derive(Debug, Clone, FromRow)]
pub struct DraftProduct {
    pub id: Uuid,
    pub spu: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub bullets_short: Option<String>,
    pub bullets_medium: Option<String>,
    pub bullets_long: Option<String>,
    pub legacy_text_zh: Option<String>,
    pub image_folder: Option<String>,
    pub raw_row: serde_json::Value,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// A draft variant, keyed by `(spu, sku)`.
///
/// `spu` is a soft reference to [`DraftProduct::spu`]; the import tooling
/// does not enforce it as a foreign key.
#[derive(Debug, Clone, FromRow)]
pub struct DraftVariant {
    pub id: Uuid,
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
    pub image_urls: Vec<String>,
    pub raw_row: serde_json::Value,
    pub status: String,
}
