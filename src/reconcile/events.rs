//! Event ledger operations: add, amend, remove, plus match deletion with
//! its reversal cascade. Every operation is one snapshot, one computed
//! write-set, one atomic batch.

use crate::domain::{
    stored_minute, EventId, EventKind, Match, MatchEvent, MatchId, MatchStatus, PlayerId, Role,
    SeasonContext, Side, EVENTS_FIELD,
};
use crate::engine::{event_deltas, outcome_deltas, score_move};
use crate::error::AppError;
use crate::reconcile::audit::{self, AuditLog};
use crate::reconcile::snapshot::{load_match, load_player, load_season, MatchSnapshot};
use crate::reconcile::{encode, stage_deltas};
use crate::store::{paths, DocumentStore, WriteBatch};
use std::sync::Arc;
use tracing::info;

/// Caller-supplied event data for add and amend.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub kind: EventKind,
    pub player_id: PlayerId,
    /// Minute relative to the match's current phase.
    pub minute: u32,
    /// Optional assister; only valid when `kind` is `Goal`.
    pub assister_id: Option<PlayerId>,
}

struct PreparedEvent {
    event: MatchEvent,
    linked_assist: Option<MatchEvent>,
}

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn DocumentStore>,
    audit: AuditLog,
}

impl EventService {
    pub fn new(store: Arc<dyn DocumentStore>, audit: AuditLog) -> Self {
        EventService { store, audit }
    }

    pub async fn add_event(
        &self,
        ctx: &SeasonContext,
        role: Role,
        match_id: &MatchId,
        input: NewEvent,
    ) -> Result<MatchEvent, AppError> {
        role.require_ledger()?;
        let snap = load_match(self.store.as_ref(), ctx, match_id).await?;
        if !snap.match_doc.status.allows_events() {
            return Err(AppError::Validation(
                "events can only be recorded for a live or finished match".to_string(),
            ));
        }

        let prepared = self.prepare(ctx, &snap, &input, None).await?;
        let match_path = paths::match_doc(&ctx.season_id, match_id);

        let mut batch = WriteBatch::new();
        batch.require_version(match_path.as_str(), snap.version);
        batch.array_append(match_path.as_str(), EVENTS_FIELD, encode(&prepared.event)?);
        stage_event_effects(
            &mut batch,
            ctx,
            &match_path,
            &snap.match_doc,
            &prepared.event,
            1,
        )?;
        if let Some(assist) = &prepared.linked_assist {
            batch.array_append(match_path.as_str(), EVENTS_FIELD, encode(assist)?);
            stage_event_effects(&mut batch, ctx, &match_path, &snap.match_doc, assist, 1)?;
        }

        self.store.commit(batch).await?;
        info!(
            match_id = %match_id,
            event_id = %prepared.event.id,
            kind = ?prepared.event.kind,
            "ledger event added"
        );
        self.audit
            .record(
                role,
                audit::ADD_MATCH_EVENT,
                &format!(
                    "{:?} by player {} at minute {} in match {}",
                    prepared.event.kind, prepared.event.player_id, prepared.event.minute, match_id
                ),
            )
            .await;
        Ok(prepared.event)
    }

    pub async fn amend_event(
        &self,
        ctx: &SeasonContext,
        role: Role,
        match_id: &MatchId,
        event_id: &EventId,
        input: NewEvent,
    ) -> Result<MatchEvent, AppError> {
        role.require_ledger()?;
        let snap = load_match(self.store.as_ref(), ctx, match_id).await?;
        let old = snap
            .match_doc
            .event(event_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("event {}", event_id)))?;
        if old.is_linked_assist() {
            return Err(AppError::Validation(
                "a linked assist is amended through its goal".to_string(),
            ));
        }

        let prepared = self.prepare(ctx, &snap, &input, Some(old.id.clone())).await?;
        let match_path = paths::match_doc(&ctx.season_id, match_id);

        let mut batch = WriteBatch::new();
        batch.require_version(match_path.as_str(), snap.version);

        // Reverse the old event, and the assist it owned, if any.
        batch.array_remove(match_path.as_str(), EVENTS_FIELD, encode(&old)?);
        stage_event_effects(&mut batch, ctx, &match_path, &snap.match_doc, &old, -1)?;
        if old.kind == EventKind::Goal {
            if let Some(assist) = snap.match_doc.linked_assist_of(&old.id).cloned() {
                batch.array_remove(match_path.as_str(), EVENTS_FIELD, encode(&assist)?);
                stage_event_effects(&mut batch, ctx, &match_path, &snap.match_doc, &assist, -1)?;
            }
        }

        // Apply the new data, mirroring add.
        batch.array_append(match_path.as_str(), EVENTS_FIELD, encode(&prepared.event)?);
        stage_event_effects(
            &mut batch,
            ctx,
            &match_path,
            &snap.match_doc,
            &prepared.event,
            1,
        )?;
        if let Some(assist) = &prepared.linked_assist {
            batch.array_append(match_path.as_str(), EVENTS_FIELD, encode(assist)?);
            stage_event_effects(&mut batch, ctx, &match_path, &snap.match_doc, assist, 1)?;
        }

        self.store.commit(batch).await?;
        info!(match_id = %match_id, event_id = %event_id, "ledger event amended");
        self.audit
            .record(
                role,
                audit::AMEND_MATCH_EVENT,
                &format!("event {} in match {} rewritten", event_id, match_id),
            )
            .await;
        Ok(prepared.event)
    }

    pub async fn remove_event(
        &self,
        ctx: &SeasonContext,
        role: Role,
        match_id: &MatchId,
        event_id: &EventId,
    ) -> Result<(), AppError> {
        role.require_ledger()?;
        let snap = load_match(self.store.as_ref(), ctx, match_id).await?;
        let old = snap
            .match_doc
            .event(event_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("event {}", event_id)))?;
        if old.is_linked_assist() {
            return Err(AppError::Validation(
                "a linked assist is removed through its goal".to_string(),
            ));
        }

        let match_path = paths::match_doc(&ctx.season_id, match_id);
        let mut batch = WriteBatch::new();
        batch.require_version(match_path.as_str(), snap.version);
        batch.array_remove(match_path.as_str(), EVENTS_FIELD, encode(&old)?);
        stage_event_effects(&mut batch, ctx, &match_path, &snap.match_doc, &old, -1)?;
        if old.kind == EventKind::Goal {
            if let Some(assist) = snap.match_doc.linked_assist_of(&old.id).cloned() {
                batch.array_remove(match_path.as_str(), EVENTS_FIELD, encode(&assist)?);
                stage_event_effects(&mut batch, ctx, &match_path, &snap.match_doc, &assist, -1)?;
            }
        }

        self.store.commit(batch).await?;
        info!(match_id = %match_id, event_id = %event_id, "ledger event removed");
        self.audit
            .record(
                role,
                audit::REMOVE_MATCH_EVENT,
                &format!("event {} removed from match {}", event_id, match_id),
            )
            .await;
        Ok(())
    }

    /// Delete a match. Every event's aggregate effect, and the recorded
    /// outcome when the match is finished, is reversed in the same batch
    /// that removes the document.
    pub async fn delete_match(
        &self,
        ctx: &SeasonContext,
        role: Role,
        match_id: &MatchId,
    ) -> Result<(), AppError> {
        role.require_ledger()?;
        let snap = load_match(self.store.as_ref(), ctx, match_id).await?;
        let match_path = paths::match_doc(&ctx.season_id, match_id);

        let mut batch = WriteBatch::new();
        batch.require_version(match_path.as_str(), snap.version);
        for event in &snap.match_doc.events {
            let opponent = opponent_of(&snap.match_doc, event)?;
            stage_deltas(&mut batch, ctx, &event_deltas(event, &opponent, -1));
        }
        if snap.match_doc.status == MatchStatus::Finished {
            stage_deltas(
                &mut batch,
                ctx,
                &outcome_deltas(
                    &snap.match_doc.home_team_id,
                    &snap.match_doc.away_team_id,
                    snap.match_doc.home_score,
                    snap.match_doc.away_score,
                    -1,
                ),
            );
        }
        batch.delete(match_path.as_str());

        self.store.commit(batch).await?;
        info!(match_id = %match_id, events = snap.match_doc.events.len(), "match deleted");
        self.audit
            .record(
                role,
                audit::DELETE_MATCH,
                &format!("match {} deleted with its ledger reversed", match_id),
            )
            .await;
        Ok(())
    }

    /// The ledger in presentation order.
    pub async fn list_events(
        &self,
        ctx: &SeasonContext,
        match_id: &MatchId,
    ) -> Result<Vec<MatchEvent>, AppError> {
        let path = paths::match_doc(&ctx.season_id, match_id);
        let doc = self
            .store
            .get(&path)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("match {}", match_id)))?;
        let match_doc: Match = doc.decode()?;
        Ok(match_doc.sorted_events())
    }

    /// Validate caller input against the snapshot and build the event (and
    /// its linked assist, when a goal names an assister).
    async fn prepare(
        &self,
        ctx: &SeasonContext,
        snap: &MatchSnapshot,
        input: &NewEvent,
        reuse_id: Option<EventId>,
    ) -> Result<PreparedEvent, AppError> {
        if input.assister_id.is_some() && input.kind != EventKind::Goal {
            return Err(AppError::Validation(
                "an assister can only accompany a goal".to_string(),
            ));
        }

        let season = load_season(self.store.as_ref(), ctx).await?;
        let minute = stored_minute(input.minute, &season.timing, snap.match_doc.extra_time)?;

        let player = load_player(self.store.as_ref(), ctx, &input.player_id).await?;
        if snap.match_doc.side_of(&player.team_id).is_none() {
            return Err(AppError::Validation(format!(
                "player {} does not play in this match",
                player.id
            )));
        }

        let mut event = MatchEvent::new(input.kind, player.id, player.team_id, minute);
        if let Some(id) = reuse_id {
            event.id = id;
        }

        let linked_assist = match &input.assister_id {
            Some(assister_id) => {
                let assister = load_player(self.store.as_ref(), ctx, assister_id).await?;
                if assister.team_id != event.team_id {
                    return Err(AppError::Validation(
                        "assister must play for the scoring team".to_string(),
                    ));
                }
                Some(MatchEvent::linked_assist(
                    &event,
                    assister.id,
                    assister.team_id,
                ))
            }
            None => None,
        };

        Ok(PreparedEvent {
            event,
            linked_assist,
        })
    }
}

/// Stage one event's delta-model and scoreboard effects with the given
/// factor.
fn stage_event_effects(
    batch: &mut WriteBatch,
    ctx: &SeasonContext,
    match_path: &str,
    match_doc: &Match,
    event: &MatchEvent,
    factor: i64,
) -> Result<(), AppError> {
    let side = event_side(match_doc, event)?;
    let opponent = match_doc.team_on(side.opposite()).clone();
    stage_deltas(batch, ctx, &event_deltas(event, &opponent, factor));
    if let Some((score_side, amount)) = score_move(event.kind, side, factor) {
        batch.increment(match_path, score_side.score_field(), amount);
    }
    Ok(())
}

fn event_side(match_doc: &Match, event: &MatchEvent) -> Result<Side, AppError> {
    match_doc.side_of(&event.team_id).ok_or_else(|| {
        AppError::Internal(format!(
            "event {} references a team outside its match",
            event.id
        ))
    })
}

fn opponent_of(match_doc: &Match, event: &MatchEvent) -> Result<crate::domain::TeamId, AppError> {
    let side = event_side(match_doc, event)?;
    Ok(match_doc.team_on(side.opposite()).clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AppConfig, MatchTiming, Player, Season, SeasonId, Stage, Team,
    };
    use crate::store::MemoryStore;
    use chrono::Utc;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: EventService,
        ctx: SeasonContext,
        match_id: MatchId,
        home_player: PlayerId,
        away_player: PlayerId,
        home_player_2: PlayerId,
    }

    async fn fixture(status: MatchStatus) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let season_id = SeasonId::new("s1".to_string());
        let ctx = SeasonContext::new(season_id.clone());

        let mut season = Season::new(
            "Test".to_string(),
            2026,
            MatchTiming::default(),
            Utc::now(),
        );
        season.id = season_id.clone();
        let config = AppConfig {
            current_season_id: Some(season_id.clone()),
            seasons: vec![season],
            logging_enabled: false,
        };

        let home = Team::new("Home".to_string(), "H".to_string());
        let away = Team::new("Away".to_string(), "A".to_string());
        let home_player = Player::new(home.id.clone(), "Nine".to_string());
        let home_player_2 = Player::new(home.id.clone(), "Ten".to_string());
        let away_player = Player::new(away.id.clone(), "Four".to_string());
        let mut match_doc = Match::new(
            home.id.clone(),
            away.id.clone(),
            Utc::now(),
            Stage::Group,
        )
        .unwrap();
        match_doc.status = status;

        let mut batch = WriteBatch::new();
        batch
            .set(paths::APP_CONFIG, encode(&config).unwrap())
            .set(paths::team(&season_id, &home.id), encode(&home).unwrap())
            .set(paths::team(&season_id, &away.id), encode(&away).unwrap())
            .set(
                paths::player(&season_id, &home_player.id),
                encode(&home_player).unwrap(),
            )
            .set(
                paths::player(&season_id, &home_player_2.id),
                encode(&home_player_2).unwrap(),
            )
            .set(
                paths::player(&season_id, &away_player.id),
                encode(&away_player).unwrap(),
            )
            .set(
                paths::match_doc(&season_id, &match_doc.id),
                encode(&match_doc).unwrap(),
            );
        store.commit(batch).await.unwrap();

        let service = EventService::new(store.clone(), AuditLog::new(store.clone()));
        Fixture {
            store,
            service,
            ctx,
            match_id: match_doc.id,
            home_player: home_player.id,
            away_player: away_player.id,
            home_player_2: home_player_2.id,
        }
    }

    impl Fixture {
        async fn match_doc(&self) -> Match {
            self.store
                .get(&paths::match_doc(&self.ctx.season_id, &self.match_id))
                .await
                .unwrap()
                .unwrap()
                .decode()
                .unwrap()
        }
    }

    fn goal(player: &PlayerId) -> NewEvent {
        NewEvent {
            kind: EventKind::Goal,
            player_id: player.clone(),
            minute: 10,
            assister_id: None,
        }
    }

    #[tokio::test]
    async fn test_add_goal_moves_score() {
        let f = fixture(MatchStatus::Live).await;
        f.service
            .add_event(&f.ctx, Role::Staff, &f.match_id, goal(&f.home_player))
            .await
            .unwrap();

        let m = f.match_doc().await;
        assert_eq!(m.home_score, 1);
        assert_eq!(m.away_score, 0);
        assert_eq!(m.events.len(), 1);
    }

    #[tokio::test]
    async fn test_own_goal_credits_opposing_side() {
        let f = fixture(MatchStatus::Live).await;
        f.service
            .add_event(
                &f.ctx,
                Role::Staff,
                &f.match_id,
                NewEvent {
                    kind: EventKind::OwnGoal,
                    player_id: f.home_player.clone(),
                    minute: 20,
                    assister_id: None,
                },
            )
            .await
            .unwrap();

        let m = f.match_doc().await;
        assert_eq!(m.home_score, 0);
        assert_eq!(m.away_score, 1);
    }

    #[tokio::test]
    async fn test_upcoming_match_rejects_events() {
        let f = fixture(MatchStatus::Upcoming).await;
        let result = f
            .service
            .add_event(&f.ctx, Role::Staff, &f.match_id, goal(&f.home_player))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_anonymous_rejected() {
        let f = fixture(MatchStatus::Live).await;
        let result = f
            .service
            .add_event(&f.ctx, Role::Anonymous, &f.match_id, goal(&f.home_player))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_assister_on_card_rejected() {
        let f = fixture(MatchStatus::Live).await;
        let result = f
            .service
            .add_event(
                &f.ctx,
                Role::Staff,
                &f.match_id,
                NewEvent {
                    kind: EventKind::YellowCard,
                    player_id: f.home_player.clone(),
                    minute: 10,
                    assister_id: Some(f.home_player_2.clone()),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_cross_team_assister_rejected() {
        let f = fixture(MatchStatus::Live).await;
        let result = f
            .service
            .add_event(
                &f.ctx,
                Role::Staff,
                &f.match_id,
                NewEvent {
                    kind: EventKind::Goal,
                    player_id: f.home_player.clone(),
                    minute: 10,
                    assister_id: Some(f.away_player.clone()),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_goal_with_assister_creates_two_linked_events() {
        let f = fixture(MatchStatus::Live).await;
        let goal_event = f
            .service
            .add_event(
                &f.ctx,
                Role::Staff,
                &f.match_id,
                NewEvent {
                    kind: EventKind::Goal,
                    player_id: f.home_player.clone(),
                    minute: 33,
                    assister_id: Some(f.home_player_2.clone()),
                },
            )
            .await
            .unwrap();

        let m = f.match_doc().await;
        assert_eq!(m.events.len(), 2);
        let assist = m.linked_assist_of(&goal_event.id).unwrap();
        assert_eq!(assist.kind, EventKind::Assist);
        assert_eq!(assist.minute, 33);
        assert_eq!(assist.player_id, f.home_player_2);
    }

    #[tokio::test]
    async fn test_linked_assist_cannot_be_removed_directly() {
        let f = fixture(MatchStatus::Live).await;
        let goal_event = f
            .service
            .add_event(
                &f.ctx,
                Role::Staff,
                &f.match_id,
                NewEvent {
                    kind: EventKind::Goal,
                    player_id: f.home_player.clone(),
                    minute: 33,
                    assister_id: Some(f.home_player_2.clone()),
                },
            )
            .await
            .unwrap();

        let m = f.match_doc().await;
        let assist_id = m.linked_assist_of(&goal_event.id).unwrap().id.clone();

        let result = f
            .service
            .remove_event(&f.ctx, Role::Staff, &f.match_id, &assist_id)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        // Removing the goal removes both.
        f.service
            .remove_event(&f.ctx, Role::Staff, &f.match_id, &goal_event.id)
            .await
            .unwrap();
        assert!(f.match_doc().await.events.is_empty());
    }

    #[tokio::test]
    async fn test_amend_goal_to_other_side_moves_score_across() {
        let f = fixture(MatchStatus::Live).await;
        let event = f
            .service
            .add_event(&f.ctx, Role::Staff, &f.match_id, goal(&f.home_player))
            .await
            .unwrap();
        assert_eq!(f.match_doc().await.home_score, 1);

        f.service
            .amend_event(
                &f.ctx,
                Role::Staff,
                &f.match_id,
                &event.id,
                goal(&f.away_player),
            )
            .await
            .unwrap();

        let m = f.match_doc().await;
        assert_eq!(m.home_score, 0);
        assert_eq!(m.away_score, 1);
        assert_eq!(m.events.len(), 1);
        assert_eq!(m.events[0].id, event.id);
    }

    #[tokio::test]
    async fn test_amend_unknown_event_is_not_found() {
        let f = fixture(MatchStatus::Live).await;
        let result = f
            .service
            .amend_event(
                &f.ctx,
                Role::Staff,
                &f.match_id,
                &EventId::new("missing".to_string()),
                goal(&f.home_player),
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_out_of_range_minute_rejected_without_mutation() {
        let f = fixture(MatchStatus::Live).await;
        let result = f
            .service
            .add_event(
                &f.ctx,
                Role::Staff,
                &f.match_id,
                NewEvent {
                    kind: EventKind::Goal,
                    player_id: f.home_player.clone(),
                    minute: 91,
                    assister_id: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(f.match_doc().await.events.is_empty());
    }

    #[tokio::test]
    async fn test_list_events_sorted_by_minute() {
        let f = fixture(MatchStatus::Live).await;
        for minute in [40u32, 5, 20] {
            f.service
                .add_event(
                    &f.ctx,
                    Role::Staff,
                    &f.match_id,
                    NewEvent {
                        kind: EventKind::Goal,
                        player_id: f.home_player.clone(),
                        minute,
                        assister_id: None,
                    },
                )
                .await
                .unwrap();
        }

        let events = f.service.list_events(&f.ctx, &f.match_id).await.unwrap();
        let minutes: Vec<u32> = events.iter().map(|e| e.minute).collect();
        assert_eq!(minutes, vec![5, 20, 40]);
    }
}
