//! Shopping cart model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One product in a user's cart. At most one line exists per
/// (user, product) pair; adding the same product again merges into the
/// existing line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub id: u64,
    pub user_id: u64,
    pub product_id: u64,
    pub quantity: u32,
    /// Whether the line is ticked for checkout in the UI.
    #[serde(default = "default_selected")]
    pub selected: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

fn default_selected() -> bool {
    true
}

/// Cart line joined with live product data for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineView {
    pub id: u64,
    pub product_id: u64,
    pub product_name: String,
    pub product_image: String,
    pub price: Decimal,
    pub quantity: u32,
    pub selected: bool,
    /// Remaining stock, so the UI can cap the quantity stepper.
    pub stock: u32,
    pub on_sale: bool,
}

/// Partial update of a cart line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartUpdate {
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub selected: Option<bool>,
}
