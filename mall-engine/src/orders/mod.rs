//! Order lifecycle engine.
//!
//! Status graph (codes in parentheses):
//!
//! ```text
//! PendingPayment(1) ──> PendingShipment(2) ──> PendingReceipt(3) ──> Completed(4)
//!        │                      │
//!        └──────────────────────┴──> Cancelled(5)
//! ```
//!
//! Every mutation runs inside one redb write transaction; stock
//! movement and status flips commit or abort together.

pub mod manager;

#[cfg(test)]
mod tests;

pub use manager::OrderManager;
