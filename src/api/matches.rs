use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{resolved_role, AppState};
use crate::domain::{MatchId, MatchStatus, SeasonContext, SeasonId};
use crate::engine::ExtraTimeDecision;
use crate::error::AppError;
use crate::reconcile::FinishResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBody {
    pub status: MatchStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraTimeBody {
    pub decision: ExtraTimeDecision,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: MatchStatus,
    /// True when the caller must resolve the extra-time decision before the
    /// match can finish.
    pub awaiting_extra_time_decision: bool,
}

impl StatusResponse {
    fn from_status(status: MatchStatus) -> Self {
        StatusResponse {
            status,
            awaiting_extra_time_decision: status == MatchStatus::ExtraTimePending,
        }
    }
}

pub async fn set_status(
    Path((season, match_id)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<StatusBody>,
) -> Result<Json<StatusResponse>, AppError> {
    let ctx = SeasonContext::new(SeasonId::new(season));
    let status = state
        .status
        .set_status(
            &ctx,
            resolved_role(&headers),
            &MatchId::new(match_id),
            body.status,
        )
        .await?;
    Ok(Json(StatusResponse::from_status(status)))
}

pub async fn declare_finished(
    Path((season, match_id)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, AppError> {
    let ctx = SeasonContext::new(SeasonId::new(season));
    let result = state
        .status
        .declare_finished(&ctx, resolved_role(&headers), &MatchId::new(match_id))
        .await?;
    let status = match result {
        FinishResult::Finished => MatchStatus::Finished,
        FinishResult::AwaitingExtraTimeDecision => MatchStatus::ExtraTimePending,
    };
    Ok(Json(StatusResponse::from_status(status)))
}

pub async fn resolve_extra_time(
    Path((season, match_id)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ExtraTimeBody>,
) -> Result<Json<StatusResponse>, AppError> {
    let ctx = SeasonContext::new(SeasonId::new(season));
    let status = state
        .status
        .resolve_extra_time(
            &ctx,
            resolved_role(&headers),
            &MatchId::new(match_id),
            body.decision,
        )
        .await?;
    Ok(Json(StatusResponse::from_status(status)))
}

pub async fn delete_match(
    Path((season, match_id)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let ctx = SeasonContext::new(SeasonId::new(season));
    state
        .events
        .delete_match(&ctx, resolved_role(&headers), &MatchId::new(match_id))
        .await?;
    Ok(Json(serde_json::json!({"deleted": true})))
}
