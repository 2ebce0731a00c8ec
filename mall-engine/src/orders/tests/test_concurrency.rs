//! Concurrency: redb serializes writers, so racing checkouts must
//! never oversell and id allocation must never collide.

use std::thread;

use shared::ErrorKind;

use super::*;

#[test]
fn racing_checkouts_never_oversell() {
    let h = harness();
    let scarce = seed_product(&h, "scarce", 100, 1);

    let mut contexts = Vec::new();
    for user_id in 1..=2u64 {
        let address_id = seed_address(&h, user_id);
        let cart_id = h.cart.add(user_id, scarce, 1).unwrap();
        contexts.push((user_id, address_id, cart_id));
    }

    let mut handles = Vec::new();
    for (user_id, address_id, cart_id) in contexts {
        let manager = h.manager.clone();
        handles.push(thread::spawn(move || {
            manager.create_order(user_id, &checkout_request(address_id, vec![cart_id]))
        }));
    }
    let results: Vec<_> = handles.into_iter().map(|j| j.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results
        .iter()
        .find(|r| r.is_err())
        .unwrap()
        .as_ref()
        .unwrap_err();
    assert_eq!(loser.kind(), ErrorKind::Conflict);
    assert_eq!(stock_of(&h, scarce), 0);
}

#[test]
fn racing_checkouts_split_a_larger_stock() {
    let h = harness();
    let widget = seed_product(&h, "widget", 100, 5);

    let mut contexts = Vec::new();
    for user_id in 1..=5u64 {
        let address_id = seed_address(&h, user_id);
        let cart_id = h.cart.add(user_id, widget, 1).unwrap();
        contexts.push((user_id, address_id, cart_id));
    }

    let handles: Vec<_> = contexts
        .into_iter()
        .map(|(user_id, address_id, cart_id)| {
            let manager = h.manager.clone();
            thread::spawn(move || {
                manager.create_order(user_id, &checkout_request(address_id, vec![cart_id]))
            })
        })
        .collect();

    let receipts: Vec<_> = handles
        .into_iter()
        .map(|j| j.join().unwrap().unwrap())
        .collect();
    assert_eq!(stock_of(&h, widget), 0);

    // Ids and order numbers all distinct
    let mut ids: Vec<_> = receipts.iter().map(|r| r.order_id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 5);
    let mut numbers: Vec<_> = receipts.iter().map(|r| r.order_no.clone()).collect();
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 5);
}

#[test]
fn concurrent_id_allocation_is_unique() {
    let h = harness();
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let catalog = h.catalog.clone();
            thread::spawn(move || {
                (0..5)
                    .map(|i| {
                        catalog
                            .create_product(&product_input(&format!("p-{worker}-{i}"), 10, 1))
                            .unwrap()
                            .id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<u64> = handles
        .into_iter()
        .flat_map(|j| j.join().unwrap())
        .collect();
    assert_eq!(ids.len(), 40);
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 40);
    assert!(ids.iter().all(|&id| id > 1_000));
}
