//! redb-based storage layer for the mall engine
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `products` | `product_id` | `Product` | Catalog |
//! | `cart_lines` | `cart_id` | `CartLine` | Shopping carts |
//! | `addresses` | `address_id` | `Address` | Address book |
//! | `orders` | `order_id` | `Order` | Order headers |
//! | `order_items` | `(order_id, item_id)` | `OrderItem` | Item lines |
//! | `order_no_index` | `order_no` | `order_id` | Uniqueness of order numbers |
//! | `sequences` | counter name | `u64` | Id allocation |
//!
//! # Durability
//!
//! redb uses `Durability::Immediate` by default: a commit is persistent
//! as soon as `commit()` returns, and the file is always in a
//! consistent state after power loss. Dropping a write transaction
//! without committing aborts it, which is what rolls back half-applied
//! order mutations on any error path.
//!
//! # Concurrency
//!
//! redb serializes write transactions. The guarded stock decrement in
//! [`MallStorage::decrement_stock`] therefore observes the latest
//! committed stock, so concurrent checkouts can never drive stock
//! negative.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use shared::util::now_millis;

use super::models::{Address, CartLine, Order, OrderItem, Product};

/// Catalog products: key = product_id, value = JSON-serialized Product
const PRODUCTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("products");

/// Cart lines: key = cart_id, value = JSON-serialized CartLine
const CART_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("cart_lines");

/// Shipping addresses: key = address_id, value = JSON-serialized Address
const ADDRESSES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("addresses");

/// Order headers: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("orders");

/// Order item lines: key = (order_id, item_id), value = JSON-serialized OrderItem
const ORDER_ITEMS_TABLE: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("order_items");

/// Order number uniqueness index: key = order_no, value = order_id
const ORDER_NO_TABLE: TableDefinition<&str, u64> = TableDefinition::new("order_no_index");

/// Named id sequences: key = counter name, value = last issued id
const SEQUENCES_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequences");

pub const SEQ_PRODUCTS: &str = "products";
pub const SEQ_ORDERS: &str = "orders";
pub const SEQ_ORDER_ITEMS: &str = "order_items";
pub const SEQ_CART: &str = "cart";
pub const SEQ_ADDRESSES: &str = "addresses";

/// Starting offset of a counter. Orders and products start high so
/// their ids are visually distinct from the small test/user id space.
/// Unknown counters start at zero.
fn sequence_offset(counter: &str) -> u64 {
    match counter {
        SEQ_ORDERS => 10_000,
        SEQ_PRODUCTS => 1_000,
        _ => 0,
    }
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Product not found: {0}")]
    ProductNotFound(u64),

    #[error("Insufficient stock for product {product_id}: have {stock}, requested {requested}")]
    InsufficientStock {
        product_id: u64,
        stock: u32,
        requested: u32,
    },

    #[error("Order number already taken: {0}")]
    DuplicateOrderNo(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Mall storage backed by a single redb database.
#[derive(Clone)]
pub struct MallStorage {
    db: Arc<Database>,
}

impl MallStorage {
    /// Open or create the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(PRODUCTS_TABLE)?;
            let _ = write_txn.open_table(CART_TABLE)?;
            let _ = write_txn.open_table(ADDRESSES_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_ITEMS_TABLE)?;
            let _ = write_txn.open_table(ORDER_NO_TABLE)?;

            // Seed the known counters at their offsets
            let mut seq_table = write_txn.open_table(SEQUENCES_TABLE)?;
            for counter in [SEQ_PRODUCTS, SEQ_ORDERS, SEQ_ORDER_ITEMS, SEQ_CART, SEQ_ADDRESSES] {
                if seq_table.get(counter)?.is_none() {
                    seq_table.insert(counter, sequence_offset(counter))?;
                }
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequences ==========

    /// Allocate the next id from a named counter (within transaction).
    /// A counter that was never seeded starts from its offset, so
    /// first use needs no initialization.
    pub fn next_sequence(&self, txn: &WriteTransaction, counter: &str) -> StorageResult<u64> {
        let mut table = txn.open_table(SEQUENCES_TABLE)?;
        let current = table
            .get(counter)?
            .map(|guard| guard.value())
            .unwrap_or_else(|| sequence_offset(counter));
        let next = current + 1;
        table.insert(counter, next)?;
        Ok(next)
    }

    /// Last issued id of a counter (read-only).
    pub fn current_sequence(&self, counter: &str) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCES_TABLE)?;
        Ok(table
            .get(counter)?
            .map(|guard| guard.value())
            .unwrap_or_else(|| sequence_offset(counter)))
    }

    // ========== Products ==========

    pub fn put_product(&self, txn: &WriteTransaction, product: &Product) -> StorageResult<()> {
        let mut table = txn.open_table(PRODUCTS_TABLE)?;
        let value = serde_json::to_vec(product)?;
        table.insert(product.id, value.as_slice())?;
        Ok(())
    }

    pub fn get_product(&self, product_id: u64) -> StorageResult<Option<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_product_txn(
        &self,
        txn: &WriteTransaction,
        product_id: u64,
    ) -> StorageResult<Option<Product>> {
        let table = txn.open_table(PRODUCTS_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Returns true if the product existed.
    pub fn delete_product(&self, txn: &WriteTransaction, product_id: u64) -> StorageResult<bool> {
        let mut table = txn.open_table(PRODUCTS_TABLE)?;
        Ok(table.remove(product_id)?.is_some())
    }

    pub fn all_products(&self) -> StorageResult<Vec<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        let mut products = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            products.push(serde_json::from_slice(value.value())?);
        }
        Ok(products)
    }

    /// Guarded stock decrement. Fails with
    /// [`StorageError::InsufficientStock`] when the remaining stock
    /// does not cover the request; the caller aborts the transaction
    /// by dropping it.
    pub fn decrement_stock(
        &self,
        txn: &WriteTransaction,
        product_id: u64,
        quantity: u32,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PRODUCTS_TABLE)?;
        let mut product: Product = match table.get(product_id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(StorageError::ProductNotFound(product_id)),
        };
        if product.stock < quantity {
            return Err(StorageError::InsufficientStock {
                product_id,
                stock: product.stock,
                requested: quantity,
            });
        }
        product.stock -= quantity;
        product.updated_at = now_millis();
        let value = serde_json::to_vec(&product)?;
        table.insert(product_id, value.as_slice())?;
        Ok(())
    }

    /// Unconditional stock restore (order cancellation).
    pub fn increment_stock(
        &self,
        txn: &WriteTransaction,
        product_id: u64,
        quantity: u32,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PRODUCTS_TABLE)?;
        // Restoring stock of a product deleted in the meantime is a no-op
        let mut product: Product = match table.get(product_id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Ok(()),
        };
        product.stock = product.stock.saturating_add(quantity);
        product.updated_at = now_millis();
        let value = serde_json::to_vec(&product)?;
        table.insert(product_id, value.as_slice())?;
        Ok(())
    }

    /// Bump the cumulative sales counter (receipt confirmation).
    pub fn increment_sales(
        &self,
        txn: &WriteTransaction,
        product_id: u64,
        quantity: u32,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PRODUCTS_TABLE)?;
        let mut product: Product = match table.get(product_id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Ok(()),
        };
        product.sales = product.sales.saturating_add(quantity as u64);
        product.updated_at = now_millis();
        let value = serde_json::to_vec(&product)?;
        table.insert(product_id, value.as_slice())?;
        Ok(())
    }

    // ========== Cart lines ==========

    pub fn put_cart_line(&self, txn: &WriteTransaction, line: &CartLine) -> StorageResult<()> {
        let mut table = txn.open_table(CART_TABLE)?;
        let value = serde_json::to_vec(line)?;
        table.insert(line.id, value.as_slice())?;
        Ok(())
    }

    pub fn get_cart_line_txn(
        &self,
        txn: &WriteTransaction,
        cart_id: u64,
    ) -> StorageResult<Option<CartLine>> {
        let table = txn.open_table(CART_TABLE)?;
        match table.get(cart_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Returns true if the line existed.
    pub fn delete_cart_line(&self, txn: &WriteTransaction, cart_id: u64) -> StorageResult<bool> {
        let mut table = txn.open_table(CART_TABLE)?;
        Ok(table.remove(cart_id)?.is_some())
    }

    pub fn cart_lines_for_user(&self, user_id: u64) -> StorageResult<Vec<CartLine>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CART_TABLE)?;
        let mut lines = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let line: CartLine = serde_json::from_slice(value.value())?;
            if line.user_id == user_id {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    /// Find the user's existing line for a product (within transaction).
    pub fn find_cart_line_txn(
        &self,
        txn: &WriteTransaction,
        user_id: u64,
        product_id: u64,
    ) -> StorageResult<Option<CartLine>> {
        let table = txn.open_table(CART_TABLE)?;
        for result in table.iter()? {
            let (_key, value) = result?;
            let line: CartLine = serde_json::from_slice(value.value())?;
            if line.user_id == user_id && line.product_id == product_id {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    /// Load the given cart lines, keeping only those owned by the user
    /// (within transaction). Missing ids are skipped.
    pub fn load_cart_lines_txn(
        &self,
        txn: &WriteTransaction,
        cart_ids: &[u64],
        user_id: u64,
    ) -> StorageResult<Vec<CartLine>> {
        let table = txn.open_table(CART_TABLE)?;
        let mut lines = Vec::new();
        for &cart_id in cart_ids {
            if let Some(value) = table.get(cart_id)? {
                let line: CartLine = serde_json::from_slice(value.value())?;
                if line.user_id == user_id {
                    lines.push(line);
                }
            }
        }
        Ok(lines)
    }

    // ========== Addresses ==========

    pub fn put_address(&self, txn: &WriteTransaction, address: &Address) -> StorageResult<()> {
        let mut table = txn.open_table(ADDRESSES_TABLE)?;
        let value = serde_json::to_vec(address)?;
        table.insert(address.id, value.as_slice())?;
        Ok(())
    }

    pub fn get_address(&self, address_id: u64) -> StorageResult<Option<Address>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ADDRESSES_TABLE)?;
        match table.get(address_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_address_txn(
        &self,
        txn: &WriteTransaction,
        address_id: u64,
    ) -> StorageResult<Option<Address>> {
        let table = txn.open_table(ADDRESSES_TABLE)?;
        match table.get(address_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Returns true if the address existed.
    pub fn delete_address(&self, txn: &WriteTransaction, address_id: u64) -> StorageResult<bool> {
        let mut table = txn.open_table(ADDRESSES_TABLE)?;
        Ok(table.remove(address_id)?.is_some())
    }

    pub fn addresses_for_user(&self, user_id: u64) -> StorageResult<Vec<Address>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ADDRESSES_TABLE)?;
        let mut addresses = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let address: Address = serde_json::from_slice(value.value())?;
            if address.user_id == user_id {
                addresses.push(address);
            }
        }
        Ok(addresses)
    }

    pub fn addresses_for_user_txn(
        &self,
        txn: &WriteTransaction,
        user_id: u64,
    ) -> StorageResult<Vec<Address>> {
        let table = txn.open_table(ADDRESSES_TABLE)?;
        let mut addresses = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let address: Address = serde_json::from_slice(value.value())?;
            if address.user_id == user_id {
                addresses.push(address);
            }
        }
        Ok(addresses)
    }

    // ========== Orders ==========

    pub fn put_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id, value.as_slice())?;
        Ok(())
    }

    pub fn get_order(&self, order_id: u64) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: u64,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All orders of a user, soft-deleted ones excluded.
    pub fn orders_for_user(&self, user_id: u64) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if order.user_id == user_id && !order.deleted {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    /// All orders across users, soft-deleted ones excluded.
    pub fn all_orders(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if !order.deleted {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    /// Claim an order number. Fails with
    /// [`StorageError::DuplicateOrderNo`] if it is already taken, so
    /// the caller can retry with a fresh candidate inside the same
    /// transaction.
    pub fn reserve_order_no(
        &self,
        txn: &WriteTransaction,
        order_no: &str,
        order_id: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_NO_TABLE)?;
        if table.get(order_no)?.is_some() {
            return Err(StorageError::DuplicateOrderNo(order_no.to_string()));
        }
        table.insert(order_no, order_id)?;
        Ok(())
    }

    // ========== Order items ==========

    pub fn put_order_item(&self, txn: &WriteTransaction, item: &OrderItem) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_ITEMS_TABLE)?;
        let key = (item.order_id, item.id);
        let value = serde_json::to_vec(item)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// All item lines of an order, in insertion order.
    pub fn items_for_order(&self, order_id: u64) -> StorageResult<Vec<OrderItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDER_ITEMS_TABLE)?;

        let mut items = Vec::new();
        let range_start = (order_id, 0u64);
        let range_end = (order_id, u64::MAX);
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            items.push(serde_json::from_slice(value.value())?);
        }
        Ok(items)
    }

    pub fn items_for_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: u64,
    ) -> StorageResult<Vec<OrderItem>> {
        let table = txn.open_table(ORDER_ITEMS_TABLE)?;

        let mut items = Vec::new();
        let range_start = (order_id, 0u64);
        let range_end = (order_id, u64::MAX);
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            items.push(serde_json::from_slice(value.value())?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{AddressSnapshot, ProductStatus};
    use rust_decimal::Decimal;
    use shared::OrderStatus;

    fn test_product(id: u64, stock: u32) -> Product {
        Product {
            id,
            name: format!("product-{id}"),
            image: String::new(),
            images: Vec::new(),
            description: String::new(),
            price: Decimal::from(100),
            original_price: None,
            stock,
            sales: 0,
            category_id: None,
            specs: Vec::new(),
            status: ProductStatus::OnSale,
            sort: 0,
            created_at: now_millis(),
            updated_at: now_millis(),
        }
    }

    fn test_order(id: u64, user_id: u64, order_no: &str) -> Order {
        Order {
            id,
            order_no: order_no.to_string(),
            user_id,
            status: OrderStatus::PendingPayment,
            total_amount: Decimal::from(100),
            remark: None,
            address: AddressSnapshot {
                name: "tester".into(),
                phone: "13800138000".into(),
                province: "p".into(),
                city: "c".into(),
                district: "d".into(),
                detail: "street 1".into(),
            },
            carrier: None,
            tracking_no: None,
            payment_time: None,
            delivery_time: None,
            receive_time: None,
            cancel_time: None,
            cancel_reason: None,
            deleted: false,
            created_at: now_millis(),
            updated_at: now_millis(),
        }
    }

    #[test]
    fn sequences_start_at_their_offsets() {
        let storage = MallStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.next_sequence(&txn, SEQ_ORDERS).unwrap(), 10_001);
        assert_eq!(storage.next_sequence(&txn, SEQ_ORDERS).unwrap(), 10_002);
        assert_eq!(storage.next_sequence(&txn, SEQ_PRODUCTS).unwrap(), 1_001);
        assert_eq!(storage.next_sequence(&txn, SEQ_CART).unwrap(), 1);
        // A counter nobody seeded is usable immediately
        assert_eq!(storage.next_sequence(&txn, "coupons").unwrap(), 1);
        txn.commit().unwrap();
        assert_eq!(storage.current_sequence(SEQ_ORDERS).unwrap(), 10_002);
    }

    #[test]
    fn uncommitted_sequence_rolls_back() {
        let storage = MallStorage::open_in_memory().unwrap();
        {
            let txn = storage.begin_write().unwrap();
            storage.next_sequence(&txn, SEQ_ORDERS).unwrap();
            // dropped without commit
        }
        assert_eq!(storage.current_sequence(SEQ_ORDERS).unwrap(), 10_000);
    }

    #[test]
    fn decrement_stock_is_guarded() {
        let storage = MallStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.put_product(&txn, &test_product(1, 3)).unwrap();
        storage.decrement_stock(&txn, 1, 2).unwrap();
        let err = storage.decrement_stock(&txn, 1, 2).unwrap_err();
        assert!(matches!(
            err,
            StorageError::InsufficientStock {
                product_id: 1,
                stock: 1,
                requested: 2,
            }
        ));
        txn.commit().unwrap();
        assert_eq!(storage.get_product(1).unwrap().unwrap().stock, 1);
    }

    #[test]
    fn decrement_stock_of_missing_product_fails() {
        let storage = MallStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let err = storage.decrement_stock(&txn, 99, 1).unwrap_err();
        assert!(matches!(err, StorageError::ProductNotFound(99)));
    }

    #[test]
    fn stock_and_sales_counters_move_independently() {
        let storage = MallStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.put_product(&txn, &test_product(1, 5)).unwrap();
        storage.increment_stock(&txn, 1, 7).unwrap();
        storage.increment_sales(&txn, 1, 4).unwrap();
        txn.commit().unwrap();
        let product = storage.get_product(1).unwrap().unwrap();
        assert_eq!(product.stock, 12);
        assert_eq!(product.sales, 4);
    }

    #[test]
    fn order_no_reservation_rejects_duplicates() {
        let storage = MallStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.reserve_order_no(&txn, "20260101000001", 1).unwrap();
        let err = storage.reserve_order_no(&txn, "20260101000001", 2).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateOrderNo(_)));
        storage.reserve_order_no(&txn, "20260101000002", 2).unwrap();
        txn.commit().unwrap();
    }

    #[test]
    fn item_range_scan_is_isolated_per_order() {
        let storage = MallStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        for (order_id, item_id) in [(1u64, 1u64), (1, 2), (2, 3)] {
            let item = OrderItem {
                id: item_id,
                order_id,
                product_id: 1,
                product_name: "p".into(),
                product_image: String::new(),
                price: Decimal::from(10),
                quantity: 1,
                subtotal: Decimal::from(10),
                specs: Vec::new(),
                created_at: now_millis(),
            };
            storage.put_order_item(&txn, &item).unwrap();
        }
        txn.commit().unwrap();

        let items = storage.items_for_order(1).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.order_id == 1));
        assert_eq!(storage.items_for_order(2).unwrap().len(), 1);
        assert!(storage.items_for_order(3).unwrap().is_empty());
    }

    #[test]
    fn reopen_preserves_committed_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mall.redb");
        {
            let storage = MallStorage::open(&path).unwrap();
            let txn = storage.begin_write().unwrap();
            storage.put_product(&txn, &test_product(1, 3)).unwrap();
            storage.next_sequence(&txn, SEQ_ORDERS).unwrap();
            txn.commit().unwrap();
        }
        let storage = MallStorage::open(&path).unwrap();
        assert_eq!(storage.get_product(1).unwrap().unwrap().stock, 3);
        assert_eq!(storage.current_sequence(SEQ_ORDERS).unwrap(), 10_001);
    }

    #[test]
    fn soft_deleted_orders_are_invisible_to_scans() {
        let storage = MallStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.put_order(&txn, &test_order(1, 7, "A1")).unwrap();
        let mut hidden = test_order(2, 7, "A2");
        hidden.deleted = true;
        storage.put_order(&txn, &hidden).unwrap();
        txn.commit().unwrap();

        assert_eq!(storage.orders_for_user(7).unwrap().len(), 1);
        assert_eq!(storage.all_orders().unwrap().len(), 1);
        // Direct get still returns the row, callers filter on `deleted`
        assert!(storage.get_order(2).unwrap().unwrap().deleted);
    }
}
