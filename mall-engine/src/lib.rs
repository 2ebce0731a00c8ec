//! Transactional core of a small e-commerce mall: catalog, carts,
//! address book and the order lifecycle, persisted in a single redb
//! database.
//!
//! The engine is transport-agnostic. An HTTP layer would construct the
//! services here, map [`shared::ApiError`] kinds to response codes and
//! subscribe to [`OrderManager::subscribe`] for lifecycle events; none
//! of that lives in this crate.
//!
//! All order mutations run inside one redb write transaction, so stock
//! movement, status flips and cart consumption commit or abort as a
//! unit. redb serializes writers, which is what makes the guarded
//! stock decrement safe under concurrency.

pub mod addresses;
pub mod cart;
pub mod catalog;
pub mod common;
pub mod config;
pub mod db;
pub mod orders;

pub use addresses::AddressBook;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use config::Config;
pub use db::{MallStorage, StorageError};
pub use orders::OrderManager;
