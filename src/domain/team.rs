//! Team documents and their aggregate stats.

use crate::domain::TeamId;
use serde::{Deserialize, Serialize};

/// Aggregate counters for a team, moved only through reconciled deltas
/// (or the explicit owner override path).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamStats {
    pub matches_played: i64,
    pub wins: i64,
    pub draws: i64,
    pub losses: i64,
    pub goals_for: i64,
    pub goals_against: i64,
    pub assists: i64,
    pub yellow_cards: i64,
    pub red_cards: i64,
}

impl TeamStats {
    pub fn zeroed() -> Self {
        TeamStats::default()
    }

    /// Reconciler invariant: played = won + drawn + lost. Owner overrides
    /// may diverge intentionally.
    pub fn is_consistent(&self) -> bool {
        self.matches_played == self.wins + self.draws + self.losses
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub owner: String,
    pub crest: Option<String>,
    pub group_label: Option<String>,
    #[serde(default)]
    pub stats: TeamStats,
}

impl Team {
    pub fn new(name: String, owner: String) -> Self {
        Team {
            id: TeamId::fresh(),
            name,
            owner,
            crest: None,
            group_label: None,
            stats: TeamStats::zeroed(),
        }
    }

    /// Copy of this team for another season: identity preserved, stats reset.
    pub fn roster_copy(&self) -> Self {
        Team {
            id: self.id.clone(),
            name: self.name.clone(),
            owner: self.owner.clone(),
            crest: self.crest.clone(),
            group_label: self.group_label.clone(),
            stats: TeamStats::zeroed(),
        }
    }
}
