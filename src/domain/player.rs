//! Player documents and their per-player tallies.

use crate::domain::{PlayerId, TeamId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStats {
    pub goals: i64,
    pub assists: i64,
    pub yellow_cards: i64,
    pub red_cards: i64,
    pub matches_played: i64,
}

impl PlayerStats {
    pub fn zeroed() -> Self {
        PlayerStats::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub team_id: TeamId,
    pub name: String,
    pub shirt_number: Option<u8>,
    pub position: Option<String>,
    #[serde(default)]
    pub stats: PlayerStats,
}

impl Player {
    pub fn new(team_id: TeamId, name: String) -> Self {
        Player {
            id: PlayerId::fresh(),
            team_id,
            name,
            shirt_number: None,
            position: None,
            stats: PlayerStats::zeroed(),
        }
    }

    /// Copy of this player for another season: identity preserved, stats reset.
    pub fn roster_copy(&self) -> Self {
        Player {
            id: self.id.clone(),
            team_id: self.team_id.clone(),
            name: self.name.clone(),
            shirt_number: self.shirt_number,
            position: self.position.clone(),
            stats: PlayerStats::zeroed(),
        }
    }
}
