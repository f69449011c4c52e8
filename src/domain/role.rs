//! Resolved caller roles. Authentication happens upstream; the engine only
//! consumes the role it is handed.

use crate::error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Staff,
    Anonymous,
}

impl Role {
    /// Parse a role label; anything unrecognized resolves to Anonymous.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "owner" => Role::Owner,
            "staff" => Role::Staff,
            _ => Role::Anonymous,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Staff => "staff",
            Role::Anonymous => "anonymous",
        }
    }

    /// Ledger mutations (events, match status) are open to staff and owner.
    pub fn require_ledger(&self) -> Result<(), AppError> {
        match self {
            Role::Owner | Role::Staff => Ok(()),
            Role::Anonymous => Err(AppError::Forbidden(
                "ledger operations require staff or owner access".to_string(),
            )),
        }
    }

    /// Season lifecycle operations are owner-only.
    pub fn require_owner(&self) -> Result<(), AppError> {
        match self {
            Role::Owner => Ok(()),
            _ => Err(AppError::Forbidden(
                "season operations require owner access".to_string(),
            )),
        }
    }
}
