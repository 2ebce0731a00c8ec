//! Catalog product model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One name/value pair of a product specification, e.g. "color: red".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecEntry {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    OnSale,
    OffSale,
}

impl ProductStatus {
    pub fn is_on_sale(self) -> bool {
        matches!(self, Self::OnSale)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    pub stock: u32,
    /// Cumulative units sold, incremented when orders complete.
    #[serde(default)]
    pub sales: u64,
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub specs: Vec<SpecEntry>,
    pub status: ProductStatus,
    /// Listing sort weight, higher first.
    #[serde(default)]
    pub sort: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    pub stock: u32,
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub specs: Option<Vec<SpecEntry>>,
    #[serde(default)]
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub sort: Option<i32>,
}

/// Partial update, `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub original_price: Option<Option<Decimal>>,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub category_id: Option<Option<u64>>,
    #[serde(default)]
    pub specs: Option<Vec<SpecEntry>>,
    #[serde(default)]
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub sort: Option<i32>,
}
