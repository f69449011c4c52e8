use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{resolved_role, AppState};
use crate::domain::{MatchTiming, Season, SeasonContext, SeasonId, TeamId, TeamStats};
use crate::error::AppError;
use crate::reconcile::{ImportSummary, NewSeason, ResetSummary, WipeSummary};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceSeasonBody {
    pub name: String,
    pub year: i32,
    pub timing: Option<MatchTiming>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonDto {
    pub id: String,
    pub name: String,
    pub year: i32,
    pub timing: MatchTiming,
    pub current: bool,
}

impl SeasonDto {
    fn current(season: Season) -> Self {
        SeasonDto {
            id: season.id.0,
            name: season.name,
            year: season.year,
            timing: season.timing,
            current: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBody {
    pub source_season_id: String,
}

pub async fn advance_season(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AdvanceSeasonBody>,
) -> Result<Json<SeasonDto>, AppError> {
    let season = state
        .lifecycle
        .advance_season(
            resolved_role(&headers),
            NewSeason {
                name: body.name,
                year: body.year,
                timing: body.timing,
            },
        )
        .await?;
    Ok(Json(SeasonDto::current(season)))
}

pub async fn delete_season(
    Path(season): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .lifecycle
        .delete_season(resolved_role(&headers), &SeasonId::new(season))
        .await?;
    Ok(Json(serde_json::json!({"deleted": true})))
}

pub async fn reset_stats(
    Path(season): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ResetSummary>, AppError> {
    let ctx = SeasonContext::new(SeasonId::new(season));
    let summary = state
        .lifecycle
        .reset_stats(&ctx, resolved_role(&headers))
        .await?;
    Ok(Json(summary))
}

pub async fn wipe_data(
    Path(season): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<WipeSummary>, AppError> {
    let ctx = SeasonContext::new(SeasonId::new(season));
    let summary = state
        .lifecycle
        .wipe_data(&ctx, resolved_role(&headers))
        .await?;
    Ok(Json(summary))
}

pub async fn import_roster(
    Path(season): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ImportBody>,
) -> Result<Json<ImportSummary>, AppError> {
    let target = SeasonContext::new(SeasonId::new(season));
    let summary = state
        .lifecycle
        .import_roster(
            resolved_role(&headers),
            &SeasonId::new(body.source_season_id),
            &target,
        )
        .await?;
    Ok(Json(summary))
}

pub async fn override_team_stats(
    Path((season, team)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(stats): Json<TeamStats>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ctx = SeasonContext::new(SeasonId::new(season));
    let team = state
        .lifecycle
        .override_team_stats(&ctx, resolved_role(&headers), &TeamId::new(team), stats)
        .await?;
    Ok(Json(serde_json::json!({
        "teamId": team.id.as_str(),
        "stats": serde_json::to_value(&team.stats).map_err(|e| AppError::Internal(e.to_string()))?,
    })))
}
