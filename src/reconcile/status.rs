//! Match status transitions and the extra-time decision protocol. Outcome
//! counters move only here, when a match crosses into or out of finished.

use crate::domain::{
    MatchId, MatchStatus, Role, SeasonContext, EXTRA_TIME_FIELD, STATUS_FIELD,
};
use crate::engine::{
    finish_disposition, transition_deltas, ExtraTimeDecision, FinishDisposition,
};
use crate::error::AppError;
use crate::reconcile::audit::{self, AuditLog};
use crate::reconcile::snapshot::{load_match, MatchSnapshot};
use crate::reconcile::{encode, stage_deltas};
use crate::store::{paths, DocumentStore, WriteBatch};
use std::sync::Arc;
use tracing::info;

/// What declaring a match finished resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishResult {
    Finished,
    AwaitingExtraTimeDecision,
}

#[derive(Clone)]
pub struct StatusService {
    store: Arc<dyn DocumentStore>,
    audit: AuditLog,
}

impl StatusService {
    pub fn new(store: Arc<dyn DocumentStore>, audit: AuditLog) -> Self {
        StatusService { store, audit }
    }

    /// Generic status transition, returning the resulting status. Finishing
    /// a live match is routed through the finish disposition so the
    /// extra-time gate cannot be bypassed; leaving `ExtraTimePending` only
    /// happens via `resolve_extra_time`.
    pub async fn set_status(
        &self,
        ctx: &SeasonContext,
        role: Role,
        match_id: &MatchId,
        new_status: MatchStatus,
    ) -> Result<MatchStatus, AppError> {
        role.require_ledger()?;
        let snap = load_match(self.store.as_ref(), ctx, match_id).await?;
        let old_status = snap.match_doc.status;

        if old_status == new_status {
            return Ok(old_status);
        }
        if !old_status.can_transition_to(new_status) {
            return Err(AppError::Validation(format!(
                "cannot move a {:?} match to {:?}",
                old_status, new_status
            )));
        }

        if old_status == MatchStatus::Live && new_status == MatchStatus::Finished {
            return Ok(match self.finish_live(ctx, role, &snap, match_id).await? {
                FinishResult::Finished => MatchStatus::Finished,
                FinishResult::AwaitingExtraTimeDecision => MatchStatus::ExtraTimePending,
            });
        }

        self.apply_transition(ctx, role, &snap, match_id, new_status, false)
            .await?;
        Ok(new_status)
    }

    /// Declare a live match finished. Level-score knockout matches that
    /// have not yet played extra time land in the pending decision state
    /// instead of finishing.
    pub async fn declare_finished(
        &self,
        ctx: &SeasonContext,
        role: Role,
        match_id: &MatchId,
    ) -> Result<FinishResult, AppError> {
        role.require_ledger()?;
        let snap = load_match(self.store.as_ref(), ctx, match_id).await?;
        if snap.match_doc.status != MatchStatus::Live {
            return Err(AppError::Validation(
                "only a live match can be declared finished".to_string(),
            ));
        }
        self.finish_live(ctx, role, &snap, match_id).await
    }

    /// Resolve the pending extra-time decision, returning the resulting
    /// status.
    pub async fn resolve_extra_time(
        &self,
        ctx: &SeasonContext,
        role: Role,
        match_id: &MatchId,
        decision: ExtraTimeDecision,
    ) -> Result<MatchStatus, AppError> {
        role.require_ledger()?;
        let snap = load_match(self.store.as_ref(), ctx, match_id).await?;
        if snap.match_doc.status != MatchStatus::ExtraTimePending {
            return Err(AppError::Validation(
                "match has no pending extra-time decision".to_string(),
            ));
        }

        match decision {
            ExtraTimeDecision::ConcludeDraw => {
                self.apply_transition(ctx, role, &snap, match_id, MatchStatus::Finished, false)
                    .await?;
                Ok(MatchStatus::Finished)
            }
            ExtraTimeDecision::InitiateExtraTime => {
                // Back to live with the extra-time window open; no outcome yet.
                self.apply_transition(ctx, role, &snap, match_id, MatchStatus::Live, true)
                    .await?;
                Ok(MatchStatus::Live)
            }
        }
    }

    async fn finish_live(
        &self,
        ctx: &SeasonContext,
        role: Role,
        snap: &MatchSnapshot,
        match_id: &MatchId,
    ) -> Result<FinishResult, AppError> {
        let m = &snap.match_doc;
        match finish_disposition(m.stage, m.home_score, m.away_score, m.extra_time) {
            FinishDisposition::AwaitExtraTimeDecision => {
                self.apply_transition(
                    ctx,
                    role,
                    snap,
                    match_id,
                    MatchStatus::ExtraTimePending,
                    false,
                )
                .await?;
                Ok(FinishResult::AwaitingExtraTimeDecision)
            }
            FinishDisposition::Finish => {
                self.apply_transition(ctx, role, snap, match_id, MatchStatus::Finished, false)
                    .await?;
                Ok(FinishResult::Finished)
            }
        }
    }

    /// Stage and commit one status change: outcome reversal with the old
    /// score where the match was finished, outcome application with the
    /// current score where it now finishes, then the status field itself.
    async fn apply_transition(
        &self,
        ctx: &SeasonContext,
        role: Role,
        snap: &MatchSnapshot,
        match_id: &MatchId,
        new_status: MatchStatus,
        set_extra_time: bool,
    ) -> Result<(), AppError> {
        let m = &snap.match_doc;
        let was_finished = m.status == MatchStatus::Finished;
        let now_finished = new_status == MatchStatus::Finished;
        let score = (m.home_score, m.away_score);

        let match_path = paths::match_doc(&ctx.season_id, match_id);
        let mut batch = WriteBatch::new();
        batch.require_version(match_path.as_str(), snap.version);
        stage_deltas(
            &mut batch,
            ctx,
            &transition_deltas(
                &m.home_team_id,
                &m.away_team_id,
                was_finished,
                now_finished,
                score,
                score,
            ),
        );
        batch.set_field(match_path.as_str(), STATUS_FIELD, encode(&new_status)?);
        if set_extra_time {
            batch.set_field(match_path.as_str(), EXTRA_TIME_FIELD, encode(&true)?);
        }

        self.store.commit(batch).await?;
        info!(
            match_id = %match_id,
            from = ?m.status,
            to = ?new_status,
            "match status changed"
        );
        self.audit
            .record(
                role,
                audit::SET_MATCH_STATUS,
                &format!("match {} moved {:?} -> {:?}", match_id, m.status, new_status),
            )
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AppConfig, Match, MatchTiming, Season, SeasonId, Stage, Team, TeamStats,
    };
    use chrono::Utc;
    use crate::store::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: StatusService,
        ctx: SeasonContext,
        match_id: MatchId,
        home_id: crate::domain::TeamId,
        away_id: crate::domain::TeamId,
    }

    async fn fixture(stage: Stage, status: MatchStatus, score: (i64, i64)) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let season_id = SeasonId::new("s1".to_string());
        let ctx = SeasonContext::new(season_id.clone());

        let mut season = Season::new("Test".to_string(), 2026, MatchTiming::default(), Utc::now());
        season.id = season_id.clone();
        let config = AppConfig {
            current_season_id: Some(season_id.clone()),
            seasons: vec![season],
            logging_enabled: false,
        };

        let home = Team::new("Home".to_string(), "H".to_string());
        let away = Team::new("Away".to_string(), "A".to_string());
        let mut match_doc =
            Match::new(home.id.clone(), away.id.clone(), Utc::now(), stage).unwrap();
        match_doc.status = status;
        match_doc.home_score = score.0;
        match_doc.away_score = score.1;

        let mut batch = WriteBatch::new();
        batch
            .set(paths::APP_CONFIG, encode(&config).unwrap())
            .set(paths::team(&season_id, &home.id), encode(&home).unwrap())
            .set(paths::team(&season_id, &away.id), encode(&away).unwrap())
            .set(
                paths::match_doc(&season_id, &match_doc.id),
                encode(&match_doc).unwrap(),
            );
        store.commit(batch).await.unwrap();

        let service = StatusService::new(store.clone(), AuditLog::new(store.clone()));
        Fixture {
            store,
            service,
            ctx,
            match_id: match_doc.id,
            home_id: home.id,
            away_id: away.id,
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

        async fn team_stats(&self, team_id: &crate::domain::TeamId) -> TeamStats {
            let team: Team = self
                .store
                .get(&paths::team(&self.ctx.season_id, team_id))
                .await
                .unwrap()
                .unwrap()
                .decode()
                .unwrap();
            team.stats
        }
    }

    #[tokio::test]
    async fn test_decided_live_match_finishes_directly() {
        let f = fixture(Stage::Group, MatchStatus::Live, (2, 1)).await;
        let result = f
            .service
            .declare_finished(&f.ctx, Role::Staff, &f.match_id)
            .await
            .unwrap();
        assert_eq!(result, FinishResult::Finished);

        let m = f.match_doc().await;
        assert_eq!(m.status, MatchStatus::Finished);

        let home = f.team_stats(&f.home_id).await;
        let away = f.team_stats(&f.away_id).await;
        assert_eq!((home.wins, home.matches_played), (1, 1));
        assert_eq!((away.losses, away.matches_played), (1, 1));
        assert!(home.is_consistent() && away.is_consistent());
    }

    #[tokio::test]
    async fn test_level_knockout_match_requires_decision() {
        let f = fixture(Stage::SemiFinal, MatchStatus::Live, (0, 0)).await;
        let result = f
            .service
            .declare_finished(&f.ctx, Role::Staff, &f.match_id)
            .await
            .unwrap();
        assert_eq!(result, FinishResult::AwaitingExtraTimeDecision);

        let m = f.match_doc().await;
        assert_eq!(m.status, MatchStatus::ExtraTimePending);

        // No outcome has been applied yet.
        let home = f.team_stats(&f.home_id).await;
        assert_eq!(home.matches_played, 0);
    }

    #[tokio::test]
    async fn test_conclude_draw_from_pending() {
        let f = fixture(Stage::SemiFinal, MatchStatus::Live, (1, 1)).await;
        f.service
            .declare_finished(&f.ctx, Role::Staff, &f.match_id)
            .await
            .unwrap();
        let result = f
            .service
            .resolve_extra_time(
                &f.ctx,
                Role::Staff,
                &f.match_id,
                ExtraTimeDecision::ConcludeDraw,
            )
            .await
            .unwrap();
        assert_eq!(result, MatchStatus::Finished);

        let home = f.team_stats(&f.home_id).await;
        let away = f.team_stats(&f.away_id).await;
        assert_eq!(home.draws, 1);
        assert_eq!(away.draws, 1);
    }

    #[tokio::test]
    async fn test_initiate_extra_time_keeps_match_live() {
        let f = fixture(Stage::Final, MatchStatus::Live, (0, 0)).await;
        f.service
            .declare_finished(&f.ctx, Role::Staff, &f.match_id)
            .await
            .unwrap();
        f.service
            .resolve_extra_time(
                &f.ctx,
                Role::Staff,
                &f.match_id,
                ExtraTimeDecision::InitiateExtraTime,
            )
            .await
            .unwrap();

        let m = f.match_doc().await;
        assert_eq!(m.status, MatchStatus::Live);
        assert!(m.extra_time);
        assert_eq!(f.team_stats(&f.home_id).await.matches_played, 0);

        // A second finish with extra time active concludes level scores.
        let result = f
            .service
            .declare_finished(&f.ctx, Role::Staff, &f.match_id)
            .await
            .unwrap();
        assert_eq!(result, FinishResult::Finished);
    }

    #[tokio::test]
    async fn test_revert_then_refinish_is_idempotent() {
        let f = fixture(Stage::Group, MatchStatus::Live, (3, 0)).await;
        f.service
            .declare_finished(&f.ctx, Role::Staff, &f.match_id)
            .await
            .unwrap();
        f.service
            .set_status(&f.ctx, Role::Staff, &f.match_id, MatchStatus::Live)
            .await
            .unwrap();
        f.service
            .declare_finished(&f.ctx, Role::Staff, &f.match_id)
            .await
            .unwrap();

        let home = f.team_stats(&f.home_id).await;
        let away = f.team_stats(&f.away_id).await;
        assert_eq!((home.wins, home.matches_played), (1, 1));
        assert_eq!((away.losses, away.matches_played), (1, 1));
    }

    #[tokio::test]
    async fn test_set_status_finished_from_live_respects_gate() {
        let f = fixture(Stage::QuarterFinal, MatchStatus::Live, (2, 2)).await;
        let result = f
            .service
            .set_status(&f.ctx, Role::Staff, &f.match_id, MatchStatus::Finished)
            .await
            .unwrap();
        assert_eq!(result, MatchStatus::ExtraTimePending);
        assert_eq!(f.match_doc().await.status, MatchStatus::ExtraTimePending);
    }

    #[tokio::test]
    async fn test_postpone_has_no_aggregate_effect() {
        let f = fixture(Stage::Group, MatchStatus::Live, (1, 0)).await;
        f.service
            .set_status(&f.ctx, Role::Staff, &f.match_id, MatchStatus::Postponed)
            .await
            .unwrap();

        assert_eq!(f.match_doc().await.status, MatchStatus::Postponed);
        assert_eq!(f.team_stats(&f.home_id).await, TeamStats::zeroed());
    }

    #[tokio::test]
    async fn test_invalid_transition_rejected() {
        let f = fixture(Stage::Group, MatchStatus::Upcoming, (0, 0)).await;
        let result = f
            .service
            .set_status(&f.ctx, Role::Staff, &f.match_id, MatchStatus::Finished)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_pending_state_locked_to_decision_endpoint() {
        let f = fixture(Stage::SemiFinal, MatchStatus::Live, (0, 0)).await;
        f.service
            .declare_finished(&f.ctx, Role::Staff, &f.match_id)
            .await
            .unwrap();

        let result = f
            .service
            .set_status(&f.ctx, Role::Staff, &f.match_id, MatchStatus::Finished)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
