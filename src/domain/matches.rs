//! Match documents: status machine, stages, sides, and the embedded
//! event ledger.

use crate::domain::{EventId, MatchEvent, MatchId, TeamId};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field pointers into the match document, used by batch ops.
pub const EVENTS_FIELD: &str = "/events";
pub const STATUS_FIELD: &str = "/status";
pub const EXTRA_TIME_FIELD: &str = "/extraTime";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Group,
    QuarterFinal,
    SemiFinal,
    Final,
    Other,
}

impl Stage {
    pub fn all() -> [Stage; 5] {
        [
            Stage::Group,
            Stage::QuarterFinal,
            Stage::SemiFinal,
            Stage::Final,
            Stage::Other,
        ]
    }

    /// Group-phase matches never go to extra time.
    pub fn is_group(&self) -> bool {
        matches!(self, Stage::Group)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Upcoming,
    Live,
    ExtraTimePending,
    Finished,
    Postponed,
}

impl MatchStatus {
    /// Events may be recorded live or as historical corrections.
    pub fn allows_events(&self) -> bool {
        matches!(self, MatchStatus::Live | MatchStatus::Finished)
    }

    /// Transitions accepted by the generic status operation. Leaving
    /// `ExtraTimePending` goes through the extra-time decision instead.
    pub fn can_transition_to(&self, next: MatchStatus) -> bool {
        use MatchStatus::*;
        matches!(
            (self, next),
            (Upcoming, Live)
                | (Upcoming, Postponed)
                | (Live, Finished)
                | (Live, Postponed)
                | (Finished, Live)
                | (Postponed, Upcoming)
        )
    }
}

/// Home or away side of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }

    /// Field pointer of this side's score in the match document.
    pub fn score_field(&self) -> &'static str {
        match self {
            Side::Home => "/homeScore",
            Side::Away => "/awayScore",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub kickoff: DateTime<Utc>,
    pub venue: Option<String>,
    pub stage: Stage,
    pub status: MatchStatus,
    pub home_score: i64,
    pub away_score: i64,
    pub extra_time: bool,
    #[serde(default)]
    pub events: Vec<MatchEvent>,
}

impl Match {
    pub fn new(
        home_team_id: TeamId,
        away_team_id: TeamId,
        kickoff: DateTime<Utc>,
        stage: Stage,
    ) -> Result<Self, AppError> {
        if home_team_id == away_team_id {
            return Err(AppError::Validation(
                "home and away team must differ".to_string(),
            ));
        }
        Ok(Match {
            id: MatchId::fresh(),
            home_team_id,
            away_team_id,
            kickoff,
            venue: None,
            stage,
            status: MatchStatus::Upcoming,
            home_score: 0,
            away_score: 0,
            extra_time: false,
            events: Vec::new(),
        })
    }

    /// Which side a team plays on, if it is part of this match.
    pub fn side_of(&self, team_id: &TeamId) -> Option<Side> {
        if team_id == &self.home_team_id {
            Some(Side::Home)
        } else if team_id == &self.away_team_id {
            Some(Side::Away)
        } else {
            None
        }
    }

    pub fn team_on(&self, side: Side) -> &TeamId {
        match side {
            Side::Home => &self.home_team_id,
            Side::Away => &self.away_team_id,
        }
    }

    pub fn opponent_of(&self, team_id: &TeamId) -> Option<&TeamId> {
        self.side_of(team_id)
            .map(|side| self.team_on(side.opposite()))
    }

    pub fn event(&self, id: &EventId) -> Option<&MatchEvent> {
        self.events.iter().find(|e| &e.id == id)
    }

    /// The assist owned by the given goal, if one exists.
    pub fn linked_assist_of(&self, goal_id: &EventId) -> Option<&MatchEvent> {
        self.events
            .iter()
            .find(|e| e.linked_goal_id.as_ref() == Some(goal_id))
    }

    /// Ledger presentation order: minute ascending, ties stable in
    /// insertion order.
    pub fn sorted_events(&self) -> Vec<MatchEvent> {
        let mut events = self.events.clone();
        events.sort_by_key(|e| e.minute);
        events
    }
}
