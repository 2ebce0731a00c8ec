//! Catalog service: product CRUD and browsing.
//!
//! Stock and sales counters on products are owned by the order flow;
//! this service only seeds and edits them administratively.

use rust_decimal::Decimal;

use shared::util::now_millis;
use shared::{ApiError, ApiResult, Page};

use crate::common::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, validate_required_text};
use crate::db::models::{Product, ProductCreate, ProductStatus, ProductUpdate};
use crate::db::storage::SEQ_PRODUCTS;
use crate::db::{MallStorage, commit_txn, storage_failure};

#[derive(Clone)]
pub struct CatalogService {
    storage: MallStorage,
}

impl CatalogService {
    pub fn new(storage: MallStorage) -> Self {
        Self { storage }
    }

    pub fn create_product(&self, input: &ProductCreate) -> ApiResult<Product> {
        validate_required_text(&input.name, "product name", MAX_NAME_LEN)?;
        if input.price < Decimal::ZERO {
            return Err(ApiError::validation("price must not be negative"));
        }
        if let Some(description) = &input.description
            && description.len() > MAX_NOTE_LEN
        {
            return Err(ApiError::validation("description is too long"));
        }

        let txn = self.storage.begin_write().map_err(storage_failure)?;
        let now = now_millis();
        let product = Product {
            id: self
                .storage
                .next_sequence(&txn, SEQ_PRODUCTS)
                .map_err(storage_failure)?,
            name: input.name.trim().to_string(),
            image: input.image.clone().unwrap_or_default(),
            images: input.images.clone().unwrap_or_default(),
            description: input.description.clone().unwrap_or_default(),
            price: input.price,
            original_price: input.original_price,
            stock: input.stock,
            sales: 0,
            category_id: input.category_id,
            specs: input.specs.clone().unwrap_or_default(),
            status: input.status.unwrap_or(ProductStatus::OnSale),
            sort: input.sort.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };
        self.storage
            .put_product(&txn, &product)
            .map_err(storage_failure)?;
        commit_txn(txn)?;
        tracing::info!(product_id = product.id, name = %product.name, "Product created");
        Ok(product)
    }

    pub fn update_product(&self, product_id: u64, update: &ProductUpdate) -> ApiResult<Product> {
        let txn = self.storage.begin_write().map_err(storage_failure)?;
        let mut product = self
            .storage
            .get_product_txn(&txn, product_id)
            .map_err(storage_failure)?
            .ok_or_else(|| ApiError::not_found("product"))?;

        if let Some(name) = &update.name {
            validate_required_text(name, "product name", MAX_NAME_LEN)?;
            product.name = name.trim().to_string();
        }
        if let Some(price) = update.price {
            if price < Decimal::ZERO {
                return Err(ApiError::validation("price must not be negative"));
            }
            product.price = price;
        }
        if let Some(original_price) = update.original_price {
            product.original_price = original_price;
        }
        if let Some(image) = &update.image {
            product.image = image.clone();
        }
        if let Some(images) = &update.images {
            product.images = images.clone();
        }
        if let Some(description) = &update.description {
            product.description = description.clone();
        }
        if let Some(stock) = update.stock {
            product.stock = stock;
        }
        if let Some(category_id) = update.category_id {
            product.category_id = category_id;
        }
        if let Some(specs) = &update.specs {
            product.specs = specs.clone();
        }
        if let Some(status) = update.status {
            product.status = status;
        }
        if let Some(sort) = update.sort {
            product.sort = sort;
        }

        product.updated_at = now_millis();
        self.storage
            .put_product(&txn, &product)
            .map_err(storage_failure)?;
        commit_txn(txn)?;
        Ok(product)
    }

    pub fn get_product(&self, product_id: u64) -> ApiResult<Product> {
        self.storage
            .get_product(product_id)
            .map_err(storage_failure)?
            .ok_or_else(|| ApiError::not_found("product"))
    }

    /// Products ordered by sort weight (higher first), then newest.
    pub fn list_products(
        &self,
        status: Option<ProductStatus>,
        page: u32,
        page_size: u32,
    ) -> ApiResult<Page<Product>> {
        let mut products = self.storage.all_products().map_err(storage_failure)?;
        if let Some(status) = status {
            products.retain(|p| p.status == status);
        }
        products.sort_by(|a, b| b.sort.cmp(&a.sort).then(b.id.cmp(&a.id)));
        Ok(Page::slice(products, page, page_size))
    }

    pub fn remove_product(&self, product_id: u64) -> ApiResult<()> {
        let txn = self.storage.begin_write().map_err(storage_failure)?;
        if !self
            .storage
            .delete_product(&txn, product_id)
            .map_err(storage_failure)?
        {
            return Err(ApiError::not_found("product"));
        }
        commit_txn(txn)?;
        tracing::info!(product_id, "Product removed");
        Ok(())
    }
}
