use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{resolved_role, AppState};
use crate::domain::{EventId, EventKind, MatchEvent, MatchId, PlayerId, SeasonContext, SeasonId};
use crate::error::AppError;
use crate::reconcile::NewEvent;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBody {
    pub kind: EventKind,
    pub player_id: String,
    pub minute: u32,
    pub assister_id: Option<String>,
}

impl EventBody {
    fn into_new_event(self) -> NewEvent {
        NewEvent {
            kind: self.kind,
            player_id: PlayerId::new(self.player_id),
            minute: self.minute,
            assister_id: self.assister_id.map(PlayerId::new),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    pub id: String,
    pub kind: EventKind,
    pub player_id: String,
    pub team_id: String,
    pub minute: u32,
    pub linked_goal_id: Option<String>,
}

impl From<MatchEvent> for EventDto {
    fn from(event: MatchEvent) -> Self {
        EventDto {
            id: event.id.0,
            kind: event.kind,
            player_id: event.player_id.0,
            team_id: event.team_id.0,
            minute: event.minute,
            linked_goal_id: event.linked_goal_id.map(|id| id.0),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsResponse {
    pub events: Vec<EventDto>,
}

pub async fn list_events(
    Path((season, match_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<EventsResponse>, AppError> {
    let ctx = SeasonContext::new(SeasonId::new(season));
    let events = state
        .events
        .list_events(&ctx, &MatchId::new(match_id))
        .await?;
    Ok(Json(EventsResponse {
        events: events.into_iter().map(EventDto::from).collect(),
    }))
}

pub async fn add_event(
    Path((season, match_id)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<EventBody>,
) -> Result<Json<EventDto>, AppError> {
    let ctx = SeasonContext::new(SeasonId::new(season));
    let event = state
        .events
        .add_event(
            &ctx,
            resolved_role(&headers),
            &MatchId::new(match_id),
            body.into_new_event(),
        )
        .await?;
    Ok(Json(event.into()))
}

pub async fn amend_event(
    Path((season, match_id, event_id)): Path<(String, String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<EventBody>,
) -> Result<Json<EventDto>, AppError> {
    let ctx = SeasonContext::new(SeasonId::new(season));
    let event = state
        .events
        .amend_event(
            &ctx,
            resolved_role(&headers),
            &MatchId::new(match_id),
            &EventId::new(event_id),
            body.into_new_event(),
        )
        .await?;
    Ok(Json(event.into()))
}

pub async fn remove_event(
    Path((season, match_id, event_id)): Path<(String, String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let ctx = SeasonContext::new(SeasonId::new(season));
    state
        .events
        .remove_event(
            &ctx,
            resolved_role(&headers),
            &MatchId::new(match_id),
            &EventId::new(event_id),
        )
        .await?;
    Ok(Json(serde_json::json!({"removed": true})))
}
