pub mod address;
pub mod cart;
pub mod order;
pub mod product;

pub use address::{Address, AddressInput, AddressSnapshot, AddressUpdate};
pub use cart::{CartLine, CartLineView, CartUpdate};
pub use order::{
    AdminOrderSummary, Order, OrderItem, OrderItemView, OrderStatistics, OrderSummary, OrderView,
};
pub use product::{Product, ProductCreate, ProductStatus, ProductUpdate, SpecEntry};
