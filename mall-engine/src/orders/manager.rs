//! Order manager: the transactional command surface for the order
//! lifecycle.
//!
//! The manager processes each operation synchronously inside a single
//! redb write transaction and broadcasts a lifecycle event only after
//! the transaction committed. Error paths simply return early; the
//! dropped transaction aborts and nothing becomes visible.

use chrono::Utc;
use rand::Rng;
use redb::WriteTransaction;
use rust_decimal::Decimal;
use tokio::sync::broadcast;

use shared::order::{
    AdminOrderQuery, CreateOrderRequest, OrderLifecycleEvent, OrderReceipt,
};
use shared::util::now_millis;
use shared::{ApiError, ApiResult, OrderStatus, Page};

use crate::audit_log;
use crate::common::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text,
};
use crate::db::models::{
    AddressSnapshot, AdminOrderSummary, Order, OrderItem, OrderItemView, OrderStatistics,
    OrderSummary, OrderView, SpecEntry,
};
use crate::db::storage::{SEQ_ORDER_ITEMS, SEQ_ORDERS};
use crate::db::{MallStorage, StorageError, commit_txn, storage_failure};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Attempts at a fresh order number before giving up. Collisions need
/// two orders in the same millisecond with the same random suffix, so
/// more than one retry is already rare.
const ORDER_NO_MAX_ATTEMPTS: usize = 5;

fn check_transition(order: &Order, target: OrderStatus) -> ApiResult<()> {
    if !order.status.can_transition_to(target) {
        return Err(ApiError::illegal_transition(order.status, target));
    }
    Ok(())
}

/// Per-line working data gathered while validating a checkout.
struct LineSnapshot {
    cart_id: u64,
    product_id: u64,
    product_name: String,
    product_image: String,
    price: Decimal,
    specs: Vec<SpecEntry>,
    quantity: u32,
    subtotal: Decimal,
}

#[derive(Clone)]
pub struct OrderManager {
    storage: MallStorage,
    event_tx: broadcast::Sender<OrderLifecycleEvent>,
}

impl OrderManager {
    pub fn new(storage: MallStorage) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { storage, event_tx }
    }

    /// Subscribe to lifecycle events. Events are sent after commit, so
    /// a receiver never observes a mutation that later rolled back.
    pub fn subscribe(&self) -> broadcast::Receiver<OrderLifecycleEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, order: &Order) {
        let event = OrderLifecycleEvent {
            order_id: order.id,
            order_no: order.order_no.clone(),
            user_id: order.user_id,
            status: order.status,
            total_amount: order.total_amount,
            timestamp: now_millis(),
        };
        let _ = self.event_tx.send(event);
    }

    fn commit(&self, txn: WriteTransaction) -> ApiResult<()> {
        commit_txn(txn)
    }

    /// Millisecond timestamp prefix plus a 6-digit random suffix.
    fn generate_order_no() -> String {
        let prefix = Utc::now().format("%Y%m%d%H%M%S%3f");
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
        format!("{prefix}{suffix:06}")
    }

    /// Load a live order inside a transaction, hiding soft-deleted
    /// rows. `user_id` of `None` means back-office access without an
    /// ownership check.
    fn load_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: u64,
        user_id: Option<u64>,
    ) -> ApiResult<Order> {
        let order = self
            .storage
            .get_order_txn(txn, order_id)
            .map_err(storage_failure)?
            .filter(|o| !o.deleted)
            .ok_or_else(|| ApiError::not_found("order"))?;
        if let Some(user_id) = user_id
            && order.user_id != user_id
        {
            return Err(ApiError::forbidden("order belongs to another user"));
        }
        Ok(order)
    }

    /// Put every item's quantity back on the shelf (cancellation).
    fn restore_stock_txn(&self, txn: &WriteTransaction, order_id: u64) -> ApiResult<()> {
        let items = self
            .storage
            .items_for_order_txn(txn, order_id)
            .map_err(storage_failure)?;
        for item in &items {
            self.storage
                .increment_stock(txn, item.product_id, item.quantity)
                .map_err(storage_failure)?;
        }
        Ok(())
    }

    /// Credit every item's quantity to product sales (completion).
    fn record_sales_txn(&self, txn: &WriteTransaction, order_id: u64) -> ApiResult<()> {
        let items = self
            .storage
            .items_for_order_txn(txn, order_id)
            .map_err(storage_failure)?;
        for item in &items {
            self.storage
                .increment_sales(txn, item.product_id, item.quantity)
                .map_err(storage_failure)?;
        }
        Ok(())
    }

    // ========== Checkout ==========

    /// Create an order from the user's cart lines.
    ///
    /// In one transaction: validates the address and every line's
    /// product, decrements stock, persists the order with an address
    /// snapshot and frozen item prices, consumes the cart lines and
    /// reserves a unique order number. Any failure aborts the whole
    /// thing.
    pub fn create_order(
        &self,
        user_id: u64,
        request: &CreateOrderRequest,
    ) -> ApiResult<OrderReceipt> {
        let address_id = request
            .address_id
            .ok_or_else(|| ApiError::validation("shipping address is required"))?;
        if request.cart_ids.is_empty() {
            return Err(ApiError::validation("cart items are required"));
        }
        validate_optional_text(&request.remark, "remark", MAX_NOTE_LEN)?;

        // Repeated ids must not charge a line twice
        let mut cart_ids = request.cart_ids.clone();
        cart_ids.sort_unstable();
        cart_ids.dedup();

        let txn = self.storage.begin_write().map_err(storage_failure)?;

        let address = self
            .storage
            .get_address_txn(&txn, address_id)
            .map_err(storage_failure)?
            .filter(|a| a.user_id == user_id)
            .ok_or_else(|| ApiError::not_found("shipping address"))?;

        // Stale or foreign ids are skipped rather than failing the
        // checkout; a resubmitted request with some lines already
        // consumed still goes through with whatever remains.
        let lines = self
            .storage
            .load_cart_lines_txn(&txn, &cart_ids, user_id)
            .map_err(storage_failure)?;
        if lines.is_empty() {
            return Err(ApiError::not_found("cart item"));
        }

        // Validate every line against the live product before touching
        // stock, so the common failure paths do no work at all.
        let mut snapshots = Vec::with_capacity(lines.len());
        let mut total = Decimal::ZERO;
        for line in &lines {
            let product = self
                .storage
                .get_product_txn(&txn, line.product_id)
                .map_err(storage_failure)?
                .ok_or_else(|| ApiError::not_found("product"))?;
            if !product.status.is_on_sale() {
                return Err(ApiError::conflict(format!(
                    "product '{}' is no longer on sale",
                    product.name
                )));
            }
            if product.stock < line.quantity {
                return Err(ApiError::conflict(format!(
                    "insufficient stock for product '{}'",
                    product.name
                )));
            }
            let subtotal = product.price * Decimal::from(line.quantity);
            total += subtotal;
            snapshots.push(LineSnapshot {
                cart_id: line.id,
                product_id: product.id,
                product_name: product.name,
                product_image: product.image,
                price: product.price,
                specs: product.specs,
                quantity: line.quantity,
                subtotal,
            });
        }

        for snapshot in &snapshots {
            self.storage
                .decrement_stock(&txn, snapshot.product_id, snapshot.quantity)
                .map_err(|err| match err {
                    StorageError::InsufficientStock { .. } => {
                        ApiError::conflict("insufficient stock".to_string())
                    }
                    other => storage_failure(other),
                })?;
        }

        let order_id = self
            .storage
            .next_sequence(&txn, SEQ_ORDERS)
            .map_err(storage_failure)?;

        let mut order_no = None;
        for _ in 0..ORDER_NO_MAX_ATTEMPTS {
            let candidate = Self::generate_order_no();
            match self.storage.reserve_order_no(&txn, &candidate, order_id) {
                Ok(()) => {
                    order_no = Some(candidate);
                    break;
                }
                Err(StorageError::DuplicateOrderNo(_)) => continue,
                Err(err) => return Err(storage_failure(err)),
            }
        }
        let order_no =
            order_no.ok_or_else(|| ApiError::internal("could not allocate an order number"))?;

        let now = now_millis();
        let order = Order {
            id: order_id,
            order_no: order_no.clone(),
            user_id,
            status: OrderStatus::PendingPayment,
            total_amount: total,
            remark: request.remark.clone(),
            address: AddressSnapshot::from(&address),
            carrier: None,
            tracking_no: None,
            payment_time: None,
            delivery_time: None,
            receive_time: None,
            cancel_time: None,
            cancel_reason: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.storage.put_order(&txn, &order).map_err(storage_failure)?;

        for snapshot in snapshots {
            let item_id = self
                .storage
                .next_sequence(&txn, SEQ_ORDER_ITEMS)
                .map_err(storage_failure)?;
            let item = OrderItem {
                id: item_id,
                order_id,
                product_id: snapshot.product_id,
                product_name: snapshot.product_name,
                product_image: snapshot.product_image,
                price: snapshot.price,
                quantity: snapshot.quantity,
                subtotal: snapshot.subtotal,
                specs: snapshot.specs,
                created_at: now,
            };
            self.storage
                .put_order_item(&txn, &item)
                .map_err(storage_failure)?;
            self.storage
                .delete_cart_line(&txn, snapshot.cart_id)
                .map_err(storage_failure)?;
        }

        self.commit(txn)?;

        tracing::info!(
            order_id,
            order_no = %order_no,
            user_id,
            total = %total,
            "Order created"
        );
        self.emit(&order);

        Ok(OrderReceipt { order_id, order_no })
    }

    // ========== User-facing reads ==========

    /// The user's orders, newest first, optionally filtered by status.
    pub fn list_orders(
        &self,
        user_id: u64,
        status: Option<OrderStatus>,
        page: u32,
        page_size: u32,
    ) -> ApiResult<Page<OrderSummary>> {
        let mut orders = self
            .storage
            .orders_for_user(user_id)
            .map_err(storage_failure)?;
        if let Some(status) = status {
            orders.retain(|o| o.status == status);
        }
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let sliced = Page::slice(orders, page, page_size);
        let mut summaries = Vec::with_capacity(sliced.items.len());
        for order in sliced.items {
            let items = self
                .storage
                .items_for_order(order.id)
                .map_err(storage_failure)?;
            summaries.push(OrderSummary {
                id: order.id,
                order_no: order.order_no,
                status: order.status,
                status_text: order.status.text().to_string(),
                total_amount: order.total_amount,
                created_at: order.created_at,
                items: items.iter().map(OrderItemView::from).collect(),
            });
        }
        Ok(Page {
            items: summaries,
            total: sliced.total,
            page: sliced.page,
            page_size: sliced.page_size,
        })
    }

    pub fn get_order_detail(&self, user_id: u64, order_id: u64) -> ApiResult<OrderView> {
        let order = self
            .storage
            .get_order(order_id)
            .map_err(storage_failure)?
            .filter(|o| !o.deleted)
            .ok_or_else(|| ApiError::not_found("order"))?;
        if order.user_id != user_id {
            return Err(ApiError::forbidden("order belongs to another user"));
        }
        let items = self
            .storage
            .items_for_order(order_id)
            .map_err(storage_failure)?;
        Ok(OrderView::from_parts(order, items))
    }

    // ========== User-facing mutations ==========

    /// Cancel an order that has not shipped yet, restoring stock.
    pub fn cancel_order(&self, user_id: u64, order_id: u64) -> ApiResult<()> {
        let txn = self.storage.begin_write().map_err(storage_failure)?;
        let mut order = self.load_order_txn(&txn, order_id, Some(user_id))?;
        check_transition(&order, OrderStatus::Cancelled)?;

        self.restore_stock_txn(&txn, order_id)?;

        order.status = OrderStatus::Cancelled;
        order.cancel_time = Some(now_millis());
        order.cancel_reason = Some("cancelled by user".to_string());
        order.updated_at = now_millis();
        self.storage.put_order(&txn, &order).map_err(storage_failure)?;

        self.commit(txn)?;
        tracing::info!(order_id, user_id, "Order cancelled by user");
        self.emit(&order);
        Ok(())
    }

    /// Confirm receipt of a shipped order and credit product sales.
    pub fn confirm_receipt(&self, user_id: u64, order_id: u64) -> ApiResult<()> {
        let txn = self.storage.begin_write().map_err(storage_failure)?;
        let mut order = self.load_order_txn(&txn, order_id, Some(user_id))?;
        check_transition(&order, OrderStatus::Completed)?;

        order.status = OrderStatus::Completed;
        order.receive_time = Some(now_millis());
        order.updated_at = now_millis();
        self.storage.put_order(&txn, &order).map_err(storage_failure)?;

        self.record_sales_txn(&txn, order_id)?;

        self.commit(txn)?;
        tracing::info!(order_id, user_id, "Order receipt confirmed");
        self.emit(&order);
        Ok(())
    }

    /// Soft-delete a finished order from the user's view. Stock and
    /// sales are untouched; the row only disappears from listings.
    pub fn delete_order(&self, user_id: u64, order_id: u64) -> ApiResult<()> {
        let txn = self.storage.begin_write().map_err(storage_failure)?;
        let mut order = self.load_order_txn(&txn, order_id, Some(user_id))?;
        if !order.status.is_terminal() {
            return Err(ApiError::conflict(
                "only completed or cancelled orders can be deleted",
            ));
        }
        order.deleted = true;
        order.updated_at = now_millis();
        self.storage.put_order(&txn, &order).map_err(storage_failure)?;
        self.commit(txn)?;
        tracing::info!(order_id, user_id, "Order deleted");
        Ok(())
    }

    // ========== Back-office operations ==========

    /// Ship a paid order, recording carrier and tracking number.
    pub fn deliver_order(
        &self,
        order_id: u64,
        carrier: &str,
        tracking_no: &str,
    ) -> ApiResult<OrderView> {
        validate_required_text(carrier, "carrier", MAX_NAME_LEN)?;
        validate_required_text(tracking_no, "tracking number", MAX_SHORT_TEXT_LEN)?;

        let txn = self.storage.begin_write().map_err(storage_failure)?;
        let mut order = self.load_order_txn(&txn, order_id, None)?;
        check_transition(&order, OrderStatus::PendingReceipt)?;

        order.status = OrderStatus::PendingReceipt;
        order.carrier = Some(carrier.trim().to_string());
        order.tracking_no = Some(tracking_no.trim().to_string());
        order.delivery_time = Some(now_millis());
        order.updated_at = now_millis();
        self.storage.put_order(&txn, &order).map_err(storage_failure)?;

        let items = self
            .storage
            .items_for_order_txn(&txn, order_id)
            .map_err(storage_failure)?;
        self.commit(txn)?;

        audit_log!("admin", "deliver", format!("order:{order_id}"));
        tracing::info!(order_id, carrier, "Order delivered");
        self.emit(&order);
        Ok(OrderView::from_parts(order, items))
    }

    /// Cancel on behalf of the shop, restoring stock. Works from both
    /// pre-shipment states; the reason defaults when not given.
    pub fn admin_cancel_order(
        &self,
        order_id: u64,
        reason: Option<String>,
    ) -> ApiResult<OrderView> {
        validate_optional_text(&reason, "cancel reason", MAX_NOTE_LEN)?;

        let txn = self.storage.begin_write().map_err(storage_failure)?;
        let mut order = self.load_order_txn(&txn, order_id, None)?;
        check_transition(&order, OrderStatus::Cancelled)?;

        self.restore_stock_txn(&txn, order_id)?;

        order.status = OrderStatus::Cancelled;
        order.cancel_time = Some(now_millis());
        order.cancel_reason = Some(
            reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| "cancelled by administrator".to_string()),
        );
        order.updated_at = now_millis();
        self.storage.put_order(&txn, &order).map_err(storage_failure)?;

        let items = self
            .storage
            .items_for_order_txn(&txn, order_id)
            .map_err(storage_failure)?;
        self.commit(txn)?;

        audit_log!("admin", "cancel", format!("order:{order_id}"));
        tracing::info!(order_id, "Order cancelled by administrator");
        self.emit(&order);
        Ok(OrderView::from_parts(order, items))
    }

    /// Force a status along a legal edge, stamping the matching
    /// timestamp and running the same side effects the regular
    /// operations would: cancellation restores stock, completion
    /// credits sales.
    pub fn set_order_status(&self, order_id: u64, target: OrderStatus) -> ApiResult<OrderView> {
        let txn = self.storage.begin_write().map_err(storage_failure)?;
        let mut order = self.load_order_txn(&txn, order_id, None)?;
        check_transition(&order, target)?;

        let now = now_millis();
        match target {
            OrderStatus::PendingShipment => order.payment_time = Some(now),
            OrderStatus::PendingReceipt => order.delivery_time = Some(now),
            OrderStatus::Completed => {
                order.receive_time = Some(now);
                self.record_sales_txn(&txn, order_id)?;
            }
            OrderStatus::Cancelled => {
                order.cancel_time = Some(now);
                order.cancel_reason = Some("cancelled by administrator".to_string());
                self.restore_stock_txn(&txn, order_id)?;
            }
            // No edge leads back to PendingPayment; check_transition
            // already rejected it.
            OrderStatus::PendingPayment => {}
        }
        order.status = target;
        order.updated_at = now;
        self.storage.put_order(&txn, &order).map_err(storage_failure)?;

        let items = self
            .storage
            .items_for_order_txn(&txn, order_id)
            .map_err(storage_failure)?;
        self.commit(txn)?;

        audit_log!("admin", "set_status", format!("order:{order_id}"), target.text());
        tracing::info!(order_id, status = %target, "Order status set");
        self.emit(&order);
        Ok(OrderView::from_parts(order, items))
    }

    /// Back-office listing across all users.
    pub fn admin_list_orders(&self, query: &AdminOrderQuery) -> ApiResult<Page<AdminOrderSummary>> {
        let mut orders = self.storage.all_orders().map_err(storage_failure)?;
        if let Some(keyword) = query.keyword.as_deref().filter(|k| !k.is_empty()) {
            orders.retain(|o| o.order_no.contains(keyword));
        }
        if let Some(status) = query.status {
            orders.retain(|o| o.status == status);
        }
        if let Some(user_id) = query.user_id {
            orders.retain(|o| o.user_id == user_id);
        }
        if let Some(from) = query.created_from {
            orders.retain(|o| o.created_at >= from);
        }
        if let Some(to) = query.created_to {
            orders.retain(|o| o.created_at <= to);
        }
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let sliced = Page::slice(orders, query.page, query.page_size);
        let items = sliced
            .items
            .into_iter()
            .map(|order| AdminOrderSummary {
                id: order.id,
                order_no: order.order_no,
                user_id: order.user_id,
                status: order.status,
                status_text: order.status.text().to_string(),
                total_amount: order.total_amount,
                created_at: order.created_at,
            })
            .collect();
        Ok(Page {
            items,
            total: sliced.total,
            page: sliced.page,
            page_size: sliced.page_size,
        })
    }

    pub fn admin_get_order(&self, order_id: u64) -> ApiResult<OrderView> {
        let order = self
            .storage
            .get_order(order_id)
            .map_err(storage_failure)?
            .filter(|o| !o.deleted)
            .ok_or_else(|| ApiError::not_found("order"))?;
        let items = self
            .storage
            .items_for_order(order_id)
            .map_err(storage_failure)?;
        Ok(OrderView::from_parts(order, items))
    }

    /// Dashboard counters. Turnover counts paid orders only.
    pub fn order_statistics(&self) -> ApiResult<OrderStatistics> {
        let orders = self.storage.all_orders().map_err(storage_failure)?;
        let mut stats = OrderStatistics::default();
        for order in &orders {
            stats.total_orders += 1;
            match order.status {
                OrderStatus::PendingPayment => stats.pending_payment += 1,
                OrderStatus::PendingShipment => stats.pending_shipment += 1,
                OrderStatus::PendingReceipt => stats.pending_receipt += 1,
                OrderStatus::Completed => stats.completed += 1,
                OrderStatus::Cancelled => stats.cancelled += 1,
            }
            if matches!(
                order.status,
                OrderStatus::PendingShipment | OrderStatus::PendingReceipt | OrderStatus::Completed
            ) {
                stats.turnover += order.total_amount;
            }
        }
        Ok(stats)
    }
}
