//! Shared types for the mall order engine.
//!
//! Everything a transport layer and the engine both need to agree on:
//! the error taxonomy, the order status machine, common DTOs and
//! pagination.

pub mod error;
pub mod order;
pub mod types;
pub mod util;

pub use error::{ApiError, ApiResult, ErrorKind};
pub use order::OrderStatus;
pub use types::Page;
