//! Persistence layer: the redb storage engine and the persisted data
//! models. Everything above this module speaks in the model types and
//! never touches redb tables directly.

pub mod models;
pub mod storage;

pub use storage::{MallStorage, StorageError, StorageResult};

/// Log the real cause, surface a generic message to the caller.
pub(crate) fn storage_failure(err: StorageError) -> shared::ApiError {
    tracing::error!(error = %err, "Storage operation failed");
    shared::ApiError::internal("storage failure")
}

/// Commit a write transaction, mapping the commit error like any
/// other storage failure.
pub(crate) fn commit_txn(txn: redb::WriteTransaction) -> shared::ApiResult<()> {
    txn.commit().map_err(StorageError::from).map_err(storage_failure)
}
