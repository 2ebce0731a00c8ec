//! Order aggregate: the order header, its item lines and the view
//! types returned by the listing and detail operations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::OrderStatus;

use super::address::AddressSnapshot;
use super::product::SpecEntry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    /// Human-facing unique order number, immutable once assigned.
    pub order_no: String,
    pub user_id: u64,
    pub status: OrderStatus,
    /// Sum of item subtotals, fixed at creation.
    pub total_amount: Decimal,
    #[serde(default)]
    pub remark: Option<String>,
    pub address: AddressSnapshot,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking_no: Option<String>,
    #[serde(default)]
    pub payment_time: Option<i64>,
    #[serde(default)]
    pub delivery_time: Option<i64>,
    #[serde(default)]
    pub receive_time: Option<i64>,
    #[serde(default)]
    pub cancel_time: Option<i64>,
    #[serde(default)]
    pub cancel_reason: Option<String>,
    /// Soft-delete flag. Deleted orders stay on disk but are invisible
    /// to every listing and detail operation.
    #[serde(default)]
    pub deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Item line frozen at order creation. Price, name and image are
/// copies of the product at that moment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: u64,
    pub order_id: u64,
    pub product_id: u64,
    pub product_name: String,
    #[serde(default)]
    pub product_image: String,
    pub price: Decimal,
    pub quantity: u32,
    /// price * quantity.
    pub subtotal: Decimal,
    #[serde(default)]
    pub specs: Vec<SpecEntry>,
    pub created_at: i64,
}

/// Compact item projection used in listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemView {
    pub product_id: u64,
    pub product_name: String,
    pub product_image: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            product_image: item.product_image.clone(),
            price: item.price,
            quantity: item.quantity,
        }
    }
}

/// User-facing list entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: u64,
    pub order_no: String,
    pub status: OrderStatus,
    pub status_text: String,
    pub total_amount: Decimal,
    pub created_at: i64,
    pub items: Vec<OrderItemView>,
}

/// Back-office list entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminOrderSummary {
    pub id: u64,
    pub order_no: String,
    pub user_id: u64,
    pub status: OrderStatus,
    pub status_text: String,
    pub total_amount: Decimal,
    pub created_at: i64,
}

/// Full order detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub id: u64,
    pub order_no: String,
    pub user_id: u64,
    pub status: OrderStatus,
    pub status_text: String,
    pub total_amount: Decimal,
    pub remark: Option<String>,
    pub address: AddressSnapshot,
    pub carrier: Option<String>,
    pub tracking_no: Option<String>,
    pub payment_time: Option<i64>,
    pub delivery_time: Option<i64>,
    pub receive_time: Option<i64>,
    pub cancel_time: Option<i64>,
    pub cancel_reason: Option<String>,
    pub created_at: i64,
    pub items: Vec<OrderItem>,
}

impl OrderView {
    pub fn from_parts(order: Order, items: Vec<OrderItem>) -> Self {
        Self {
            id: order.id,
            order_no: order.order_no,
            user_id: order.user_id,
            status: order.status,
            status_text: order.status.text().to_string(),
            total_amount: order.total_amount,
            remark: order.remark,
            address: order.address,
            carrier: order.carrier,
            tracking_no: order.tracking_no,
            payment_time: order.payment_time,
            delivery_time: order.delivery_time,
            receive_time: order.receive_time,
            cancel_time: order.cancel_time,
            cancel_reason: order.cancel_reason,
            created_at: order.created_at,
            items,
        }
    }
}

/// Back-office dashboard counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderStatistics {
    pub total_orders: u64,
    pub pending_payment: u64,
    pub pending_shipment: u64,
    pub pending_receipt: u64,
    pub completed: u64,
    pub cancelled: u64,
    /// Sum of total_amount over paid orders (pending shipment,
    /// pending receipt and completed).
    pub turnover: Decimal,
}
