//! Reconciliation services: each public operation loads one consistent
//! snapshot, computes its full write-set through the pure engine, and
//! submits it as a single atomic batch.

pub mod audit;
pub mod events;
pub mod lifecycle;
pub mod snapshot;
pub mod status;

pub use audit::AuditLog;
pub use events::{EventService, NewEvent};
pub use lifecycle::{ImportSummary, LifecycleService, NewSeason, ResetSummary, WipeSummary};
pub use snapshot::MatchSnapshot;
pub use status::{FinishResult, StatusService};

use crate::domain::SeasonContext;
use crate::engine::{Delta, Target};
use crate::error::AppError;
use crate::store::{paths, WriteBatch};
use serde::Serialize;

/// Serialize a document body for a batch write.
pub(crate) fn encode<T: Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

/// Resolve a delta target to its document path within the season partition.
pub(crate) fn target_path(ctx: &SeasonContext, target: &Target) -> String {
    match target {
        Target::Team(team_id) => paths::team(&ctx.season_id, team_id),
        Target::Player(player_id) => paths::player(&ctx.season_id, player_id),
    }
}

/// Stage a set of deltas as increment ops. Increments commute, so
/// concurrent operations touching the same team or player never conflict.
pub(crate) fn stage_deltas(batch: &mut WriteBatch, ctx: &SeasonContext, deltas: &[Delta]) {
    for delta in deltas {
        batch.increment(
            target_path(ctx, &delta.target),
            delta.field.pointer(),
            delta.amount,
        );
    }
}
