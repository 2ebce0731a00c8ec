//! Error taxonomy shared across the engine and its callers.
//!
//! Every fallible operation returns [`ApiError`]. The [`ErrorKind`]
//! classification is stable and is what an HTTP layer would map to
//! response codes; the messages are free-form and safe to show to the
//! caller except for `Internal`, which carries a generic message only
//! (details go to the logs at the site that produced them).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::OrderStatus;

/// Stable classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    IllegalTransition,
    Conflict,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ApiError {
    /// Input is malformed or missing required fields.
    #[error("{0}")]
    Validation(String),

    /// The target entity does not exist (or is hidden from the caller).
    #[error("{0} not found")]
    NotFound(String),

    /// The entity exists but belongs to another principal.
    #[error("{0}")]
    Forbidden(String),

    /// The requested status change is not an edge of the lifecycle graph.
    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    /// The operation is valid in form but the current state refuses it,
    /// e.g. insufficient stock or deleting a live order.
    #[error("{0}")]
    Conflict(String),

    /// Storage or invariant failure. Message is intentionally generic.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// `resource` is the entity name, e.g. `"order"`; the display
    /// impl appends "not found".
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn illegal_transition(from: OrderStatus, to: OrderStatus) -> Self {
        Self::IllegalTransition { from, to }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::IllegalTransition { .. } => ErrorKind::IllegalTransition,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True for everything the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
