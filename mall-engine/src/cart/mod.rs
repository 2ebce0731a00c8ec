//! Shopping cart service.
//!
//! A cart holds at most one line per (user, product); adding the same
//! product again merges quantities. Quantities are capped by live
//! stock at write time, the final guarded check happens at checkout.

use shared::util::now_millis;
use shared::{ApiError, ApiResult};

use crate::db::models::{CartLine, CartLineView, CartUpdate};
use crate::db::storage::SEQ_CART;
use crate::db::{MallStorage, commit_txn, storage_failure};

#[derive(Clone)]
pub struct CartService {
    storage: MallStorage,
}

impl CartService {
    pub fn new(storage: MallStorage) -> Self {
        Self { storage }
    }

    /// The user's cart joined with live product data, newest first.
    /// Lines whose product vanished from the catalog are skipped.
    pub fn list(&self, user_id: u64) -> ApiResult<Vec<CartLineView>> {
        let mut lines = self
            .storage
            .cart_lines_for_user(user_id)
            .map_err(storage_failure)?;
        lines.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let mut views = Vec::with_capacity(lines.len());
        for line in lines {
            let Some(product) = self
                .storage
                .get_product(line.product_id)
                .map_err(storage_failure)?
            else {
                continue;
            };
            views.push(CartLineView {
                id: line.id,
                product_id: product.id,
                product_name: product.name,
                product_image: product.image,
                price: product.price,
                quantity: line.quantity,
                selected: line.selected,
                stock: product.stock,
                on_sale: product.status.is_on_sale(),
            });
        }
        Ok(views)
    }

    /// Add a product to the cart, merging into an existing line. The
    /// merged quantity must not exceed current stock.
    pub fn add(&self, user_id: u64, product_id: u64, quantity: u32) -> ApiResult<u64> {
        if quantity == 0 {
            return Err(ApiError::validation("quantity must be at least 1"));
        }

        let txn = self.storage.begin_write().map_err(storage_failure)?;

        let product = self
            .storage
            .get_product_txn(&txn, product_id)
            .map_err(storage_failure)?
            .ok_or_else(|| ApiError::not_found("product"))?;
        if !product.status.is_on_sale() {
            return Err(ApiError::conflict(format!(
                "product '{}' is no longer on sale",
                product.name
            )));
        }

        let existing = self
            .storage
            .find_cart_line_txn(&txn, user_id, product_id)
            .map_err(storage_failure)?;
        let merged = existing
            .as_ref()
            .map(|l| l.quantity)
            .unwrap_or(0)
            .checked_add(quantity)
            .ok_or_else(|| ApiError::validation("quantity is too large"))?;
        if merged > product.stock {
            return Err(ApiError::conflict(format!(
                "insufficient stock for product '{}'",
                product.name
            )));
        }

        let now = now_millis();
        let line = match existing {
            Some(mut line) => {
                line.quantity = merged;
                line.updated_at = now;
                line
            }
            None => CartLine {
                id: self
                    .storage
                    .next_sequence(&txn, SEQ_CART)
                    .map_err(storage_failure)?,
                user_id,
                product_id,
                quantity,
                selected: true,
                created_at: now,
                updated_at: now,
            },
        };
        self.storage
            .put_cart_line(&txn, &line)
            .map_err(storage_failure)?;

        let cart_id = line.id;
        commit_txn(txn)?;
        tracing::debug!(user_id, product_id, quantity = line.quantity, "Cart line upserted");
        Ok(cart_id)
    }

    /// Change quantity or checkout selection of a line.
    pub fn update(&self, user_id: u64, cart_id: u64, update: &CartUpdate) -> ApiResult<()> {
        let txn = self.storage.begin_write().map_err(storage_failure)?;

        let mut line = self
            .storage
            .get_cart_line_txn(&txn, cart_id)
            .map_err(storage_failure)?
            .ok_or_else(|| ApiError::not_found("cart item"))?;
        if line.user_id != user_id {
            return Err(ApiError::forbidden("cart item belongs to another user"));
        }

        if let Some(quantity) = update.quantity {
            if quantity == 0 {
                return Err(ApiError::validation("quantity must be at least 1"));
            }
            let product = self
                .storage
                .get_product_txn(&txn, line.product_id)
                .map_err(storage_failure)?
                .ok_or_else(|| ApiError::not_found("product"))?;
            if quantity > product.stock {
                return Err(ApiError::conflict(format!(
                    "insufficient stock for product '{}'",
                    product.name
                )));
            }
            line.quantity = quantity;
        }
        if let Some(selected) = update.selected {
            line.selected = selected;
        }
        line.updated_at = now_millis();
        self.storage
            .put_cart_line(&txn, &line)
            .map_err(storage_failure)?;
        commit_txn(txn)
    }

    pub fn remove(&self, user_id: u64, cart_id: u64) -> ApiResult<()> {
        let txn = self.storage.begin_write().map_err(storage_failure)?;

        let line = self
            .storage
            .get_cart_line_txn(&txn, cart_id)
            .map_err(storage_failure)?
            .ok_or_else(|| ApiError::not_found("cart item"))?;
        if line.user_id != user_id {
            return Err(ApiError::forbidden("cart item belongs to another user"));
        }
        self.storage
            .delete_cart_line(&txn, cart_id)
            .map_err(storage_failure)?;
        commit_txn(txn)
    }
}
