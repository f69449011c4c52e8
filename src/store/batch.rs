//! Write batches: the unit of atomic commit.

use crate::store::StoreError;
use serde_json::Value;

/// One staged write. Field pointers use JSON-pointer syntax rooted at the
/// document body (e.g. `/stats/goalsFor`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Create or fully replace a document.
    Set { path: String, body: Value },
    /// Set a single field on an existing document.
    SetField {
        path: String,
        field: &'static str,
        value: Value,
    },
    /// Delete a document. Deleting an absent document is a no-op.
    Delete { path: String },
    /// Add a signed amount to a numeric field (missing fields count as 0).
    Increment {
        path: String,
        field: &'static str,
        amount: i64,
    },
    /// Append a value to an array field (created if missing).
    ArrayAppend {
        path: String,
        field: &'static str,
        value: Value,
    },
    /// Remove every element equal to the value from an array field.
    ArrayRemove {
        path: String,
        field: &'static str,
        value: Value,
    },
}

impl WriteOp {
    pub fn path(&self) -> &str {
        match self {
            WriteOp::Set { path, .. }
            | WriteOp::SetField { path, .. }
            | WriteOp::Delete { path }
            | WriteOp::Increment { path, .. }
            | WriteOp::ArrayAppend { path, .. }
            | WriteOp::ArrayRemove { path, .. } => path,
        }
    }
}

/// A version precondition: the document at `path` must currently be at
/// `expected` (0 means "must not exist").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCheck {
    pub path: String,
    pub expected: i64,
}

/// An ordered set of writes submitted as one atomic commit.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub ops: Vec<WriteOp>,
    pub preconditions: Vec<VersionCheck>,
}

impl WriteBatch {
    pub fn new() -> Self {
        WriteBatch::default()
    }

    pub fn set(&mut self, path: impl Into<String>, body: Value) -> &mut Self {
        self.ops.push(WriteOp::Set {
            path: path.into(),
            body,
        });
        self
    }

    pub fn set_field(
        &mut self,
        path: impl Into<String>,
        field: &'static str,
        value: Value,
    ) -> &mut Self {
        self.ops.push(WriteOp::SetField {
            path: path.into(),
            field,
            value,
        });
        self
    }

    pub fn delete(&mut self, path: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete { path: path.into() });
        self
    }

    pub fn increment(
        &mut self,
        path: impl Into<String>,
        field: &'static str,
        amount: i64,
    ) -> &mut Self {
        self.ops.push(WriteOp::Increment {
            path: path.into(),
            field,
            amount,
        });
        self
    }

    pub fn array_append(
        &mut self,
        path: impl Into<String>,
        field: &'static str,
        value: Value,
    ) -> &mut Self {
        self.ops.push(WriteOp::ArrayAppend {
            path: path.into(),
            field,
            value,
        });
        self
    }

    pub fn array_remove(
        &mut self,
        path: impl Into<String>,
        field: &'static str,
        value: Value,
    ) -> &mut Self {
        self.ops.push(WriteOp::ArrayRemove {
            path: path.into(),
            field,
            value,
        });
        self
    }

    pub fn require_version(&mut self, path: impl Into<String>, expected: i64) -> &mut Self {
        self.preconditions.push(VersionCheck {
            path: path.into(),
            expected,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Apply a field-level op to a document body. Shared by store backends so
/// batch semantics cannot drift between them.
pub(crate) fn apply_field_op(path: &str, body: &mut Value, op: &WriteOp) -> Result<(), StoreError> {
    match op {
        WriteOp::SetField { field, value, .. } => {
            let slot = resolve_mut(path, body, field)?;
            *slot = value.clone();
            Ok(())
        }
        WriteOp::Increment { field, amount, .. } => {
            let slot = resolve_mut(path, body, field)?;
            let current = slot.as_i64().unwrap_or(0);
            *slot = Value::from(current + amount);
            Ok(())
        }
        WriteOp::ArrayAppend { field, value, .. } => {
            let slot = resolve_mut(path, body, field)?;
            match slot {
                Value::Array(items) => {
                    items.push(value.clone());
                    Ok(())
                }
                Value::Null => {
                    *slot = Value::Array(vec![value.clone()]);
                    Ok(())
                }
                _ => Err(StoreError::Corrupt {
                    path: path.to_string(),
                    detail: format!("field {} is not an array", field),
                }),
            }
        }
        WriteOp::ArrayRemove { field, value, .. } => {
            let slot = resolve_mut(path, body, field)?;
            match slot {
                Value::Array(items) => {
                    items.retain(|item| item != value);
                    Ok(())
                }
                Value::Null => Ok(()),
                _ => Err(StoreError::Corrupt {
                    path: path.to_string(),
                    detail: format!("field {} is not an array", field),
                }),
            }
        }
        WriteOp::Set { .. } | WriteOp::Delete { .. } => Err(StoreError::Corrupt {
            path: path.to_string(),
            detail: "document-level op routed to field application".to_string(),
        }),
    }
}

/// Walk a JSON pointer, creating intermediate objects for missing segments.
fn resolve_mut<'a>(
    path: &str,
    body: &'a mut Value,
    pointer: &str,
) -> Result<&'a mut Value, StoreError> {
    let mut current = body;
    for segment in pointer.trim_start_matches('/').split('/') {
        if current.is_null() {
            *current = Value::Object(serde_json::Map::new());
        }
        let object = match current {
            Value::Object(map) => map,
            _ => {
                return Err(StoreError::Corrupt {
                    path: path.to_string(),
                    detail: format!("segment {} of {} is not an object", segment, pointer),
                })
            }
        };
        current = object.entry(segment.to_string()).or_insert(Value::Null);
    }
    Ok(current)
}
