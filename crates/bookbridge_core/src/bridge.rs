//! Future-returning adapter over the callback store.
//!
//! # Responsibility
//! - Re-express each store primitive as an operation returning one eventual
//!   value instead of taking a completion closure.
//!
//! # Invariants
//! - Each operation settles exactly once: the completion is `FnOnce` and the
//!   oneshot sender is consumed by the send.
//! - No operation settles before the worker's completion fires.
//! - A completion dropped without firing (worker shut down) surfaces as
//!   `BridgeError::Unexpected`, never as a hang.

use crate::command::{Command, Record};
use crate::error::{BridgeError, StoreError};
use crate::store::{ExecOutcome, RawStore, StoreHandle};
use std::path::Path;
use tokio::sync::oneshot;

/// Future-returning store adapter, composed over the raw handle.
pub struct AsyncStore {
    handle: StoreHandle,
    // Kept alive so the worker joins when this adapter is dropped.
    _raw: Option<RawStore>,
}

impl AsyncStore {
    /// Opens a file-backed store owned by this adapter.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self::from_raw(RawStore::open(path)?))
    }

    /// Opens an in-memory store owned by this adapter.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::from_raw(RawStore::open_in_memory()?))
    }

    /// Wraps an owned raw store; the worker shuts down with this adapter.
    pub fn from_raw(raw: RawStore) -> Self {
        Self {
            handle: raw.handle(),
            _raw: Some(raw),
        }
    }

    /// Wraps a handle whose raw store is managed elsewhere.
    pub fn from_handle(handle: StoreHandle) -> Self {
        Self { handle, _raw: None }
    }

    /// Runs a mutating command, settling when its completion fires.
    pub async fn execute(&self, command: &Command) -> Result<ExecOutcome, BridgeError> {
        let (tx, rx) = oneshot::channel();
        self.handle.execute(command, move |result| {
            // A failed send means the caller gave up on the result.
            let _ = tx.send(result);
        });
        settle(rx).await
    }

    /// Runs a query bounded to its first matching record.
    pub async fn query_one(&self, command: &Command) -> Result<Option<Record>, BridgeError> {
        let (tx, rx) = oneshot::channel();
        self.handle.query_one(command, move |result| {
            let _ = tx.send(result);
        });
        settle(rx).await
    }

    /// Runs a query returning every matching record.
    pub async fn query_all(&self, command: &Command) -> Result<Vec<Record>, BridgeError> {
        let (tx, rx) = oneshot::channel();
        self.handle.query_all(command, move |result| {
            let _ = tx.send(result);
        });
        settle(rx).await
    }
}

async fn settle<T>(rx: oneshot::Receiver<Result<T, StoreError>>) -> Result<T, BridgeError> {
    match rx.await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(store_err)) => Err(BridgeError::Store(store_err)),
        Err(_) => Err(BridgeError::Unexpected(
            "store completion was dropped before it settled".to_string(),
        )),
    }
}
