//! Order status machine and order-facing DTOs.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle states of an order.
///
/// The numeric codes are the wire/storage representation and are part
/// of the public contract; they must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// 1: created, awaiting payment.
    PendingPayment,
    /// 2: paid, awaiting shipment.
    PendingShipment,
    /// 3: shipped, awaiting receipt confirmation.
    PendingReceipt,
    /// 4: receipt confirmed. Terminal.
    Completed,
    /// 5: cancelled by the buyer or an administrator. Terminal.
    Cancelled,
}

impl OrderStatus {
    pub const fn code(self) -> u8 {
        match self {
            Self::PendingPayment => 1,
            Self::PendingShipment => 2,
            Self::PendingReceipt => 3,
            Self::Completed => 4,
            Self::Cancelled => 5,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::PendingPayment),
            2 => Some(Self::PendingShipment),
            3 => Some(Self::PendingReceipt),
            4 => Some(Self::Completed),
            5 => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub const fn text(self) -> &'static str {
        match self {
            Self::PendingPayment => "pending payment",
            Self::PendingShipment => "pending shipment",
            Self::PendingReceipt => "pending receipt",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// The complete set of legal outgoing edges from this state.
    pub const fn allowed_next(self) -> &'static [OrderStatus] {
        match self {
            Self::PendingPayment => &[Self::PendingShipment, Self::Cancelled],
            Self::PendingShipment => &[Self::PendingReceipt, Self::Cancelled],
            Self::PendingReceipt => &[Self::Completed],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Input to order creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub address_id: Option<u64>,
    #[serde(default)]
    pub cart_ids: Vec<u64>,
    #[serde(default)]
    pub remark: Option<String>,
}

/// Minimal acknowledgement returned by order creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: u64,
    pub order_no: String,
}

/// Filters for the back-office order listing. All fields are optional
/// and combine with AND semantics; `keyword` matches a substring of
/// the order number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminOrderQuery {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub user_id: Option<u64>,
    /// Inclusive lower bound on creation time, unix millis.
    #[serde(default)]
    pub created_from: Option<i64>,
    /// Inclusive upper bound on creation time, unix millis.
    #[serde(default)]
    pub created_to: Option<i64>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

/// Broadcast after every committed order mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLifecycleEvent {
    pub order_id: u64,
    pub order_no: String,
    pub user_id: u64,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 1..=5u8 {
            let status = OrderStatus::from_code(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert_eq!(OrderStatus::from_code(0), None);
        assert_eq!(OrderStatus::from_code(6), None);
    }

    #[test]
    fn transition_table_is_exact() {
        use OrderStatus::*;
        let all = [PendingPayment, PendingShipment, PendingReceipt, Completed, Cancelled];
        for from in all {
            for to in all {
                let expected = matches!(
                    (from, to),
                    (PendingPayment, PendingShipment)
                        | (PendingPayment, Cancelled)
                        | (PendingShipment, PendingReceipt)
                        | (PendingShipment, Cancelled)
                        | (PendingReceipt, Completed)
                );
                assert_eq!(from.can_transition_to(to), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn terminal_states_have_no_edges() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Completed.allowed_next().is_empty());
        assert!(OrderStatus::Cancelled.allowed_next().is_empty());
        assert!(!OrderStatus::PendingReceipt.is_terminal());
    }
}
