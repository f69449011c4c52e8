//! In-memory document store for tests, with commit fault injection.

use crate::store::batch::apply_field_op;
use crate::store::{Document, DocumentStore, StoreError, WriteBatch, WriteOp};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct MemoryStore {
    documents: Mutex<BTreeMap<String, (Value, i64)>>,
    fail_commits: AtomicBool,
    commit_count: AtomicUsize,
    max_batch_ops: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            documents: Mutex::new(BTreeMap::new()),
            fail_commits: AtomicBool::new(false),
            commit_count: AtomicUsize::new(0),
            max_batch_ops: 500,
        }
    }

    pub fn with_document(self, path: impl Into<String>, body: Value) -> Self {
        self.documents
            .lock()
            .expect("memory store poisoned")
            .insert(path.into(), (body, 1));
        self
    }

    pub fn with_max_batch_ops(mut self, max_batch_ops: usize) -> Self {
        self.max_batch_ops = max_batch_ops;
        self
    }

    /// Make every subsequent commit fail with `StoreError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.fail_commits.store(failing, Ordering::SeqCst);
    }

    /// Number of successful commits so far (for chunking assertions).
    pub fn commit_count(&self) -> usize {
        self.commit_count.load(Ordering::SeqCst)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        let documents = self.documents.lock().expect("memory store poisoned");
        Ok(documents.get(path).map(|(body, version)| Document {
            path: path.to_string(),
            body: body.clone(),
            version: *version,
        }))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<Document>, StoreError> {
        let documents = self.documents.lock().expect("memory store poisoned");
        Ok(documents
            .range(prefix.to_string()..)
            .take_while(|(path, _)| path.starts_with(prefix))
            .map(|(path, (body, version))| Document {
                path: path.clone(),
                body: body.clone(),
                version: *version,
            })
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }

        let mut documents = self.documents.lock().expect("memory store poisoned");

        for check in &batch.preconditions {
            let found = documents.get(&check.path).map(|(_, v)| *v).unwrap_or(0);
            if found != check.expected {
                return Err(StoreError::Conflict {
                    path: check.path.clone(),
                    expected: check.expected,
                    found,
                });
            }
        }

        // Stage against a copy so a mid-batch failure leaves nothing applied.
        let mut staged = documents.clone();
        for op in &batch.ops {
            match op {
                WriteOp::Set { path, body } => {
                    let version = staged.get(path).map(|(_, v)| v + 1).unwrap_or(1);
                    staged.insert(path.clone(), (body.clone(), version));
                }
                WriteOp::Delete { path } => {
                    staged.remove(path);
                }
                field_op => {
                    let path = field_op.path().to_string();
                    let (body, version) = staged
                        .get_mut(&path)
                        .ok_or_else(|| StoreError::Missing(path.clone()))?;
                    apply_field_op(&path, body, field_op)?;
                    *version += 1;
                }
            }
        }

        *documents = staged;
        self.commit_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn max_batch_ops(&self) -> usize {
        self.max_batch_ops
    }
}
