//! Integration-style tests for the order manager, driven through the
//! public services against an in-memory database.

mod test_admin;
mod test_concurrency;

use rust_decimal::Decimal;

use shared::order::{CreateOrderRequest, OrderReceipt};

use crate::addresses::AddressBook;
use crate::cart::CartService;
use crate::catalog::CatalogService;
use crate::db::MallStorage;
use crate::db::models::{AddressInput, ProductCreate};

use super::OrderManager;

struct Harness {
    storage: MallStorage,
    manager: OrderManager,
    catalog: CatalogService,
    cart: CartService,
    addresses: AddressBook,
}

fn harness() -> Harness {
    let storage = MallStorage::open_in_memory().unwrap();
    Harness {
        manager: OrderManager::new(storage.clone()),
        catalog: CatalogService::new(storage.clone()),
        cart: CartService::new(storage.clone()),
        addresses: AddressBook::new(storage.clone()),
        storage,
    }
}

fn product_input(name: &str, price: i64, stock: u32) -> ProductCreate {
    ProductCreate {
        name: name.into(),
        image: None,
        images: None,
        description: None,
        price: Decimal::from(price),
        original_price: None,
        stock,
        category_id: None,
        specs: None,
        status: None,
        sort: None,
    }
}

fn seed_product(h: &Harness, name: &str, price: i64, stock: u32) -> u64 {
    h.catalog.create_product(&product_input(name, price, stock)).unwrap().id
}

fn seed_address(h: &Harness, user_id: u64) -> u64 {
    h.addresses
        .add(
            user_id,
            &AddressInput {
                name: "Tester".into(),
                phone: "13800138000".into(),
                province: "Province".into(),
                city: "City".into(),
                district: "District".into(),
                detail: "1 Main Street".into(),
                is_default: false,
            },
        )
        .unwrap()
        .id
}

fn checkout_request(address_id: u64, cart_ids: Vec<u64>) -> CreateOrderRequest {
    CreateOrderRequest {
        address_id: Some(address_id),
        cart_ids,
        remark: None,
    }
}

/// Seed one product into the user's cart and check it out.
fn place_order(h: &Harness, user_id: u64, product_id: u64, quantity: u32) -> OrderReceipt {
    let address_id = seed_address(h, user_id);
    let cart_id = h.cart.add(user_id, product_id, quantity).unwrap();
    h.manager
        .create_order(user_id, &checkout_request(address_id, vec![cart_id]))
        .unwrap()
}

fn stock_of(h: &Harness, product_id: u64) -> u32 {
    h.storage.get_product(product_id).unwrap().unwrap().stock
}

fn sales_of(h: &Harness, product_id: u64) -> u64 {
    h.storage.get_product(product_id).unwrap().unwrap().sales
}
