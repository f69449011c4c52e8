//! Document path layout: one physical partition per season.

use crate::domain::{MatchId, PlayerId, SeasonId, TeamId};

pub const APP_CONFIG: &str = "config/app";

pub fn team(season: &SeasonId, team: &TeamId) -> String {
    format!("season/{}/teams/{}", season, team)
}

pub fn player(season: &SeasonId, player: &PlayerId) -> String {
    format!("season/{}/players/{}", season, player)
}

pub fn match_doc(season: &SeasonId, match_id: &MatchId) -> String {
    format!("season/{}/matches/{}", season, match_id)
}

pub fn teams_prefix(season: &SeasonId) -> String {
    format!("season/{}/teams/", season)
}

pub fn players_prefix(season: &SeasonId) -> String {
    format!("season/{}/players/", season)
}

pub fn matches_prefix(season: &SeasonId) -> String {
    format!("season/{}/matches/", season)
}

pub fn log_entry(entry_id: &str) -> String {
    format!("logs/{}", entry_id)
}
