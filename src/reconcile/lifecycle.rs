//! Season lifecycle operations. Bulk write-sets are chunked at the store's
//! batch cap into sequential atomic batches; a failed chunk leaves earlier
//! chunks applied, so callers treat these as eventually complete.

use crate::domain::{
    Match, MatchStatus, MatchTiming, Player, Role, Season, SeasonContext, SeasonId, Team, TeamId,
    TeamStats,
};
use crate::error::AppError;
use crate::reconcile::audit::{self, AuditLog};
use crate::reconcile::encode;
use crate::reconcile::snapshot::{load_app_config, load_season};
use crate::store::{paths, DocumentStore, WriteBatch, WriteOp};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct NewSeason {
    pub name: String,
    pub year: i32,
    pub timing: Option<MatchTiming>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetSummary {
    pub teams: usize,
    pub players: usize,
    pub matches: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WipeSummary {
    pub documents: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub teams: usize,
    pub players: usize,
}

#[derive(Clone)]
pub struct LifecycleService {
    store: Arc<dyn DocumentStore>,
    audit: AuditLog,
}

impl LifecycleService {
    pub fn new(store: Arc<dyn DocumentStore>, audit: AuditLog) -> Self {
        LifecycleService { store, audit }
    }

    /// Zero every aggregate in the season and return every match to an
    /// empty upcoming state. Documents themselves are kept.
    pub async fn reset_stats(
        &self,
        ctx: &SeasonContext,
        role: Role,
    ) -> Result<ResetSummary, AppError> {
        role.require_owner()?;
        load_season(self.store.as_ref(), ctx).await?;

        let teams = self.store.list(&paths::teams_prefix(&ctx.season_id)).await?;
        let players = self
            .store
            .list(&paths::players_prefix(&ctx.season_id))
            .await?;
        let matches = self
            .store
            .list(&paths::matches_prefix(&ctx.season_id))
            .await?;

        let mut ops = Vec::with_capacity(teams.len() + players.len() + matches.len());
        for doc in &teams {
            let mut team: Team = doc.decode()?;
            team.stats = TeamStats::zeroed();
            ops.push(WriteOp::Set {
                path: doc.path.clone(),
                body: encode(&team)?,
            });
        }
        for doc in &players {
            let mut player: Player = doc.decode()?;
            player.stats = Default::default();
            ops.push(WriteOp::Set {
                path: doc.path.clone(),
                body: encode(&player)?,
            });
        }
        for doc in &matches {
            let mut match_doc: Match = doc.decode()?;
            match_doc.status = MatchStatus::Upcoming;
            match_doc.home_score = 0;
            match_doc.away_score = 0;
            match_doc.extra_time = false;
            match_doc.events.clear();
            ops.push(WriteOp::Set {
                path: doc.path.clone(),
                body: encode(&match_doc)?,
            });
        }

        let summary = ResetSummary {
            teams: teams.len(),
            players: players.len(),
            matches: matches.len(),
        };
        self.commit_chunked(ops, "reset_stats").await?;
        info!(season = %ctx.season_id, ?summary, "season statistics reset");
        self.audit
            .record(
                role,
                audit::RESET_SEASON,
                &format!("season {} statistics reset", ctx.season_id),
            )
            .await;
        Ok(summary)
    }

    /// Delete every team, player and match document in the season's
    /// partition. Irreversible; the season record itself is kept.
    pub async fn wipe_data(
        &self,
        ctx: &SeasonContext,
        role: Role,
    ) -> Result<WipeSummary, AppError> {
        role.require_owner()?;
        load_season(self.store.as_ref(), ctx).await?;

        let mut ops = Vec::new();
        for prefix in [
            paths::teams_prefix(&ctx.season_id),
            paths::players_prefix(&ctx.season_id),
            paths::matches_prefix(&ctx.season_id),
        ] {
            for doc in self.store.list(&prefix).await? {
                ops.push(WriteOp::Delete { path: doc.path });
            }
        }

        let summary = WipeSummary {
            documents: ops.len(),
        };
        self.commit_chunked(ops, "wipe_data").await?;
        info!(season = %ctx.season_id, documents = summary.documents, "season data wiped");
        self.audit
            .record(
                role,
                audit::WIPE_SEASON,
                &format!("season {} data wiped", ctx.season_id),
            )
            .await;
        Ok(summary)
    }

    /// Copy every team and player from the source season into the target
    /// with identity preserved and every counter zeroed. Reads fail before
    /// any write; the source season is untouched.
    pub async fn import_roster(
        &self,
        role: Role,
        source: &SeasonId,
        target: &SeasonContext,
    ) -> Result<ImportSummary, AppError> {
        role.require_owner()?;
        if source == &target.season_id {
            return Err(AppError::Validation(
                "source and target season must differ".to_string(),
            ));
        }

        let (config, _) = load_app_config(self.store.as_ref()).await?;
        if !config.contains(source) {
            return Err(AppError::NotFound(format!("source season {}", source)));
        }
        if !config.contains(&target.season_id) {
            return Err(AppError::NotFound(format!(
                "target season {}",
                target.season_id
            )));
        }

        let teams = self.store.list(&paths::teams_prefix(source)).await?;
        let players = self.store.list(&paths::players_prefix(source)).await?;

        let mut ops = Vec::with_capacity(teams.len() + players.len());
        for doc in &teams {
            let team: Team = doc.decode()?;
            let copy = team.roster_copy();
            ops.push(WriteOp::Set {
                path: paths::team(&target.season_id, &copy.id),
                body: encode(&copy)?,
            });
        }
        for doc in &players {
            let player: Player = doc.decode()?;
            let copy = player.roster_copy();
            ops.push(WriteOp::Set {
                path: paths::player(&target.season_id, &copy.id),
                body: encode(&copy)?,
            });
        }

        let summary = ImportSummary {
            teams: teams.len(),
            players: players.len(),
        };
        self.commit_chunked(ops, "import_roster").await?;
        info!(
            source = %source,
            target = %target.season_id,
            ?summary,
            "roster imported"
        );
        self.audit
            .record(
                role,
                audit::IMPORT_ROSTER,
                &format!("roster copied from season {} to {}", source, target.season_id),
            )
            .await;
        Ok(summary)
    }

    /// Create a new season record and make it current.
    pub async fn advance_season(&self, role: Role, input: NewSeason) -> Result<Season, AppError> {
        role.require_owner()?;
        let (mut config, version) = load_app_config(self.store.as_ref()).await?;

        let season = Season::new(
            input.name,
            input.year,
            input.timing.unwrap_or_default(),
            Utc::now(),
        );
        config.seasons.push(season.clone());
        config.current_season_id = Some(season.id.clone());

        let mut batch = WriteBatch::new();
        batch
            .require_version(paths::APP_CONFIG, version)
            .set(paths::APP_CONFIG, encode(&config)?);
        self.store.commit(batch).await?;

        info!(season = %season.id, year = season.year, "season advanced");
        self.audit
            .record(
                role,
                audit::ADVANCE_SEASON,
                &format!("season {} ({}) created and made current", season.name, season.year),
            )
            .await;
        Ok(season)
    }

    /// Decommission a season whose partitions are already empty. Requires
    /// at least one other season; reassigns "current" to the most recently
    /// created remaining season when needed.
    pub async fn delete_season(&self, role: Role, season_id: &SeasonId) -> Result<(), AppError> {
        role.require_owner()?;
        let (mut config, version) = load_app_config(self.store.as_ref()).await?;

        if !config.contains(season_id) {
            return Err(AppError::NotFound(format!("season {}", season_id)));
        }
        if config.seasons.len() < 2 {
            return Err(AppError::Validation(
                "at least one other season must exist".to_string(),
            ));
        }
        for prefix in [
            paths::teams_prefix(season_id),
            paths::players_prefix(season_id),
            paths::matches_prefix(season_id),
        ] {
            if !self.store.list(&prefix).await?.is_empty() {
                return Err(AppError::Validation(
                    "season data must be wiped before deletion".to_string(),
                ));
            }
        }

        config.seasons.retain(|s| &s.id != season_id);
        if config.current_season_id.as_ref() == Some(season_id) {
            config.current_season_id = config
                .seasons
                .iter()
                .max_by_key(|s| s.created_at)
                .map(|s| s.id.clone());
        }

        let mut batch = WriteBatch::new();
        batch
            .require_version(paths::APP_CONFIG, version)
            .set(paths::APP_CONFIG, encode(&config)?);
        self.store.commit(batch).await?;

        info!(season = %season_id, "season decommissioned");
        self.audit
            .record(
                role,
                audit::DELETE_SEASON,
                &format!("season {} decommissioned", season_id),
            )
            .await;
        Ok(())
    }

    /// The owner escape hatch: overwrite a team's aggregate stats wholesale,
    /// independent of the ledger. Advisory checks warn, never block.
    pub async fn override_team_stats(
        &self,
        ctx: &SeasonContext,
        role: Role,
        team_id: &TeamId,
        stats: TeamStats,
    ) -> Result<Team, AppError> {
        role.require_owner()?;
        let path = paths::team(&ctx.season_id, team_id);
        let doc = self
            .store
            .get(&path)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("team {}", team_id)))?;
        let mut team: Team = doc.decode()?;

        let mut goal_sum = 0i64;
        let mut assist_sum = 0i64;
        for player_doc in self
            .store
            .list(&paths::players_prefix(&ctx.season_id))
            .await?
        {
            let player: Player = player_doc.decode()?;
            if player.team_id == team.id {
                goal_sum += player.stats.goals;
                assist_sum += player.stats.assists;
            }
        }
        if stats.goals_for < goal_sum || stats.assists < assist_sum {
            warn!(
                team = %team.id,
                goal_sum,
                assist_sum,
                "override sets team totals below player sums"
            );
        }
        if !stats.is_consistent() {
            warn!(team = %team.id, "override diverges from played = won + drawn + lost");
        }

        team.stats = stats;
        let mut batch = WriteBatch::new();
        batch
            .require_version(path.as_str(), doc.version)
            .set(path.as_str(), encode(&team)?);
        self.store.commit(batch).await?;

        self.audit
            .record(
                role,
                audit::OVERRIDE_TEAM_STATS,
                &format!("team {} aggregates overwritten", team_id),
            )
            .await;
        Ok(team)
    }

    /// Commit ops in order, at most `max_batch_ops` per atomic batch.
    async fn commit_chunked(&self, ops: Vec<WriteOp>, what: &str) -> Result<(), AppError> {
        if ops.is_empty() {
            return Ok(());
        }
        let limit = self.store.max_batch_ops().max(1);
        let total = (ops.len() + limit - 1) / limit;

        for (index, chunk) in ops.chunks(limit).enumerate() {
            let batch = WriteBatch {
                ops: chunk.to_vec(),
                preconditions: Vec::new(),
            };
            if let Err(e) = self.store.commit(batch).await {
                error!(
                    what,
                    committed_chunks = index,
                    total_chunks = total,
                    error = %e,
                    "bulk operation interrupted; earlier chunks remain applied"
                );
                return Err(e.into());
            }
        }
        Ok(())
    }
}
