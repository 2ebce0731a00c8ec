//! Back-office operations: forced transitions, admin cancellation,
//! listing filters and statistics.

use rust_decimal::Decimal;
use shared::order::AdminOrderQuery;
use shared::{ErrorKind, OrderStatus};

use super::*;

#[test]
fn set_status_walks_only_legal_edges() {
    let h = harness();
    let widget = seed_product(&h, "widget", 100, 5);
    let receipt = place_order(&h, 1, widget, 1);

    // Skipping payment straight to completion is off the graph
    let err = h
        .manager
        .set_order_status(receipt.order_id, OrderStatus::Completed)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalTransition);
    // So is walking backwards
    let err = h
        .manager
        .set_order_status(receipt.order_id, OrderStatus::PendingPayment)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalTransition);

    let paid = h
        .manager
        .set_order_status(receipt.order_id, OrderStatus::PendingShipment)
        .unwrap();
    assert!(paid.payment_time.is_some());

    let shipped = h
        .manager
        .set_order_status(receipt.order_id, OrderStatus::PendingReceipt)
        .unwrap();
    assert!(shipped.delivery_time.is_some());

    let done = h
        .manager
        .set_order_status(receipt.order_id, OrderStatus::Completed)
        .unwrap();
    assert!(done.receive_time.is_some());
    // Forced completion still credits sales
    assert_eq!(sales_of(&h, widget), 1);

    // Terminal
    let err = h
        .manager
        .set_order_status(receipt.order_id, OrderStatus::Cancelled)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalTransition);
}

#[test]
fn forced_cancellation_restores_stock() {
    let h = harness();
    let widget = seed_product(&h, "widget", 100, 5);
    let receipt = place_order(&h, 1, widget, 2);
    assert_eq!(stock_of(&h, widget), 3);

    let cancelled = h
        .manager
        .set_order_status(receipt.order_id, OrderStatus::Cancelled)
        .unwrap();
    assert!(cancelled.cancel_time.is_some());
    assert_eq!(stock_of(&h, widget), 5);
}

#[test]
fn admin_cancel_defaults_the_reason() {
    let h = harness();
    let widget = seed_product(&h, "widget", 100, 5);
    let receipt = place_order(&h, 1, widget, 2);

    let cancelled = h.manager.admin_cancel_order(receipt.order_id, None).unwrap();
    assert_eq!(
        cancelled.cancel_reason.as_deref(),
        Some("cancelled by administrator")
    );
    assert_eq!(stock_of(&h, widget), 5);

    let receipt = place_order(&h, 1, widget, 1);
    let cancelled = h
        .manager
        .admin_cancel_order(receipt.order_id, Some("out of season".into()))
        .unwrap();
    assert_eq!(cancelled.cancel_reason.as_deref(), Some("out of season"));
}

#[test]
fn admin_listing_filters_combine() {
    let h = harness();
    let widget = seed_product(&h, "widget", 100, 20);
    let alice = place_order(&h, 1, widget, 1);
    let bob = place_order(&h, 2, widget, 1);
    h.manager.cancel_order(2, bob.order_id).unwrap();

    let everything = h.manager.admin_list_orders(&AdminOrderQuery::default()).unwrap();
    assert_eq!(everything.total, 2);

    let by_user = h
        .manager
        .admin_list_orders(&AdminOrderQuery {
            user_id: Some(1),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(by_user.total, 1);
    assert_eq!(by_user.items[0].id, alice.order_id);

    let cancelled = h
        .manager
        .admin_list_orders(&AdminOrderQuery {
            status: Some(OrderStatus::Cancelled),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(cancelled.total, 1);
    assert_eq!(cancelled.items[0].id, bob.order_id);

    let by_keyword = h
        .manager
        .admin_list_orders(&AdminOrderQuery {
            keyword: Some(alice.order_no.clone()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(by_keyword.total, 1);

    let nothing = h
        .manager
        .admin_list_orders(&AdminOrderQuery {
            user_id: Some(1),
            status: Some(OrderStatus::Cancelled),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(nothing.total, 0);

    // Page size is capped
    let capped = h
        .manager
        .admin_list_orders(&AdminOrderQuery {
            page_size: 10_000,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(capped.page_size, 100);
}

#[test]
fn admin_listing_filters_by_creation_window() {
    let h = harness();
    let widget = seed_product(&h, "widget", 100, 5);
    let receipt = place_order(&h, 1, widget, 1);
    let created_at = h
        .manager
        .admin_get_order(receipt.order_id)
        .unwrap()
        .created_at;

    let hit = h
        .manager
        .admin_list_orders(&AdminOrderQuery {
            created_from: Some(created_at),
            created_to: Some(created_at),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(hit.total, 1);

    let miss = h
        .manager
        .admin_list_orders(&AdminOrderQuery {
            created_from: Some(created_at + 1),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(miss.total, 0);
}

#[test]
fn admin_detail_spans_users() {
    let h = harness();
    let widget = seed_product(&h, "widget", 100, 5);
    let receipt = place_order(&h, 7, widget, 1);

    let view = h.manager.admin_get_order(receipt.order_id).unwrap();
    assert_eq!(view.user_id, 7);
    assert_eq!(view.items.len(), 1);
}

#[test]
fn statistics_count_by_status_and_sum_paid_turnover() {
    let h = harness();
    let widget = seed_product(&h, "widget", 100, 20);

    let _pending = place_order(&h, 1, widget, 1); // 100, unpaid
    let paid = place_order(&h, 1, widget, 2); // 200, paid
    h.manager
        .set_order_status(paid.order_id, OrderStatus::PendingShipment)
        .unwrap();
    let done = place_order(&h, 2, widget, 3); // 300, completed
    h.manager
        .set_order_status(done.order_id, OrderStatus::PendingShipment)
        .unwrap();
    h.manager
        .set_order_status(done.order_id, OrderStatus::PendingReceipt)
        .unwrap();
    h.manager
        .set_order_status(done.order_id, OrderStatus::Completed)
        .unwrap();
    let cancelled = place_order(&h, 2, widget, 4); // 400, cancelled
    h.manager.cancel_order(2, cancelled.order_id).unwrap();

    let stats = h.manager.order_statistics().unwrap();
    assert_eq!(stats.total_orders, 4);
    assert_eq!(stats.pending_payment, 1);
    assert_eq!(stats.pending_shipment, 1);
    assert_eq!(stats.pending_receipt, 0);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.cancelled, 1);
    // Unpaid and cancelled orders contribute nothing
    assert_eq!(stats.turnover, Decimal::from(500));
}
