//! Season records, timing configuration and the `config/app` document.

use crate::domain::{SeasonId, Stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Match timing configuration for a season.
///
/// `regulation_minutes` bounds event minutes during normal play;
/// `extra_time_minutes` bounds the extra-time window. Extra-time event
/// minutes are stored offset by the regulation duration so ordering is
/// preserved within a match's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchTiming {
    pub regulation_minutes: u32,
    pub extra_time_minutes: u32,
}

impl Default for MatchTiming {
    fn default() -> Self {
        MatchTiming {
            regulation_minutes: 90,
            extra_time_minutes: 30,
        }
    }
}

/// A named competitive period owning one partition of teams, players and
/// matches. Created only by the explicit advance-season operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub id: SeasonId,
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub timing: MatchTiming,
    #[serde(default)]
    pub visible_stages: Vec<Stage>,
    pub created_at: DateTime<Utc>,
}

impl Season {
    pub fn new(name: String, year: i32, timing: MatchTiming, created_at: DateTime<Utc>) -> Self {
        Season {
            id: SeasonId::fresh(),
            name,
            year,
            timing,
            visible_stages: Stage::all().to_vec(),
            created_at,
        }
    }
}

/// The `config/app` document: season registry plus process-wide switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub current_season_id: Option<SeasonId>,
    #[serde(default)]
    pub seasons: Vec<Season>,
    #[serde(default = "default_logging_enabled")]
    pub logging_enabled: bool,
}

fn default_logging_enabled() -> bool {
    true
}

impl AppConfig {
    pub fn season(&self, id: &SeasonId) -> Option<&Season> {
        self.seasons.iter().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &SeasonId) -> bool {
        self.season(id).is_some()
    }
}

/// The active season, threaded explicitly into every engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonContext {
    pub season_id: SeasonId,
}

impl SeasonContext {
    pub fn new(season_id: SeasonId) -> Self {
        SeasonContext { season_id }
    }
}
