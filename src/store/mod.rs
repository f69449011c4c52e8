//! Transactional document store abstraction.
//!
//! This module provides:
//! - The `DocumentStore` trait: per-document read, prefix listing, and
//!   atomic multi-document batch commit
//! - `WriteBatch` ops (set, set-field, delete, increment, array append and
//!   remove) plus version preconditions for compare-and-swap
//! - A SQLite-backed implementation and an in-memory one for tests
//!
//! The reconciliation logic composes batches and never assumes a specific
//! backend's primitives.

pub mod batch;
pub mod memory;
pub mod paths;
pub mod sqlite;

pub use batch::{VersionCheck, WriteBatch, WriteOp};
pub use memory::MemoryStore;
pub use sqlite::{init_store, SqliteStore};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// A stored document: its path, JSON body, and monotonically increasing
/// version. Version 0 is reserved for "does not exist" in preconditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: String,
    pub body: serde_json::Value,
    pub version: i64,
}

impl Document {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.body.clone()).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            detail: e.to_string(),
        })
    }
}

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A version precondition failed: the document changed (or appeared)
    /// since the caller's read. `found` is 0 when the document is absent.
    #[error("version check failed for {path}: expected {expected}, found {found}")]
    Conflict {
        path: String,
        expected: i64,
        found: i64,
    },
    /// A field-level op addressed a document that does not exist.
    #[error("document not found during commit: {0}")]
    Missing(String),
    /// A stored body could not be parsed or has the wrong shape.
    #[error("corrupt document at {path}: {detail}")]
    Corrupt { path: String, detail: String },
    /// Transport or backend failure; the batch outcome is unknown.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Transactional document store: point reads, prefix listing, and atomic
/// batch commit. Either every op in a batch lands or none do.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError>;

    /// All documents whose path starts with `prefix`, ordered by path.
    async fn list(&self, prefix: &str) -> Result<Vec<Document>, StoreError>;

    /// Atomically apply a batch. Version preconditions are checked first;
    /// any failure aborts the whole batch.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Largest number of ops accepted per batch; callers chunk above this.
    fn max_batch_ops(&self) -> usize {
        500
    }
}
