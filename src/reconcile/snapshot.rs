//! Consistent snapshot loading. Every operation computes its write-set from
//! one snapshot taken here, never from its own partial writes.

use crate::domain::{
    AppConfig, Match, MatchId, Player, PlayerId, Season, SeasonContext, Team,
};
use crate::error::AppError;
use crate::store::{paths, DocumentStore};
use futures::future::try_join;

/// A match with the two team documents it references, plus the match
/// document's version for the compare-and-swap precondition.
#[derive(Debug, Clone)]
pub struct MatchSnapshot {
    pub match_doc: Match,
    pub version: i64,
    pub home_team: Team,
    pub away_team: Team,
}

pub async fn load_match(
    store: &dyn DocumentStore,
    ctx: &SeasonContext,
    match_id: &MatchId,
) -> Result<MatchSnapshot, AppError> {
    let path = paths::match_doc(&ctx.season_id, match_id);
    let doc = store
        .get(&path)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("match {}", match_id)))?;
    let match_doc: Match = doc.decode()?;

    let (home, away) = try_join(
        store.get(&paths::team(&ctx.season_id, &match_doc.home_team_id)),
        store.get(&paths::team(&ctx.season_id, &match_doc.away_team_id)),
    )
    .await?;

    let home_team = home
        .ok_or_else(|| AppError::NotFound(format!("team {}", match_doc.home_team_id)))?
        .decode()?;
    let away_team = away
        .ok_or_else(|| AppError::NotFound(format!("team {}", match_doc.away_team_id)))?
        .decode()?;

    Ok(MatchSnapshot {
        match_doc,
        version: doc.version,
        home_team,
        away_team,
    })
}

pub async fn load_player(
    store: &dyn DocumentStore,
    ctx: &SeasonContext,
    player_id: &PlayerId,
) -> Result<Player, AppError> {
    store
        .get(&paths::player(&ctx.season_id, player_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("player {}", player_id)))?
        .decode()
        .map_err(AppError::from)
}

/// The `config/app` document with its version; an absent document yields
/// the default config at version 0 so first writes can precondition on it.
pub async fn load_app_config(
    store: &dyn DocumentStore,
) -> Result<(AppConfig, i64), AppError> {
    match store.get(paths::APP_CONFIG).await? {
        Some(doc) => {
            let config: AppConfig = doc.decode()?;
            Ok((config, doc.version))
        }
        None => Ok((AppConfig::default(), 0)),
    }
}

/// The season record for the given context.
pub async fn load_season(
    store: &dyn DocumentStore,
    ctx: &SeasonContext,
) -> Result<Season, AppError> {
    let (config, _) = load_app_config(store).await?;
    config
        .season(&ctx.season_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("season {}", ctx.season_id)))
}
