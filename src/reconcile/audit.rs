//! Best-effort audit log. Entries are written outside the atomic batch,
//! after commit; a failed audit write never fails the operation it records.

use crate::domain::Role;
use crate::reconcile::snapshot::load_app_config;
use crate::store::{paths, DocumentStore, WriteBatch};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

pub const ADD_MATCH_EVENT: &str = "ADD_MATCH_EVENT";
pub const AMEND_MATCH_EVENT: &str = "AMEND_MATCH_EVENT";
pub const REMOVE_MATCH_EVENT: &str = "REMOVE_MATCH_EVENT";
pub const SET_MATCH_STATUS: &str = "SET_MATCH_STATUS";
pub const DELETE_MATCH: &str = "DELETE_MATCH";
pub const RESET_SEASON: &str = "RESET_SEASON";
pub const WIPE_SEASON: &str = "WIPE_SEASON";
pub const IMPORT_ROSTER: &str = "IMPORT_ROSTER";
pub const ADVANCE_SEASON: &str = "ADVANCE_SEASON";
pub const DELETE_SEASON: &str = "DELETE_SEASON";
pub const OVERRIDE_TEAM_STATS: &str = "OVERRIDE_TEAM_STATS";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditEntry<'a> {
    timestamp: DateTime<Utc>,
    actor_label: &'a str,
    action_code: &'a str,
    free_text_details: &'a str,
}

#[derive(Clone)]
pub struct AuditLog {
    store: Arc<dyn DocumentStore>,
}

impl AuditLog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        AuditLog { store }
    }

    /// Record one entry. Swallows every failure: this log is for human
    /// review, not part of the consistency contract.
    pub async fn record(&self, actor: Role, action_code: &str, details: &str) {
        let enabled = match load_app_config(self.store.as_ref()).await {
            Ok((config, _)) => config.logging_enabled,
            Err(e) => {
                warn!(error = %e, action_code, "audit: could not read logging switch");
                return;
            }
        };
        if !enabled {
            return;
        }

        let entry = AuditEntry {
            timestamp: Utc::now(),
            actor_label: actor.label(),
            action_code,
            free_text_details: details,
        };
        let body = match serde_json::to_value(&entry) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, action_code, "audit: could not serialize entry");
                return;
            }
        };

        let mut batch = WriteBatch::new();
        batch.set(paths::log_entry(&Uuid::new_v4().to_string()), body);
        if let Err(e) = self.store.commit(batch).await {
            warn!(error = %e, action_code, "audit: write failed, entry dropped");
        }
    }
}
