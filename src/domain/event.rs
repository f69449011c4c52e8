//! Ledger events and the closed event-kind enum.

use crate::domain::{EventId, MatchTiming, PlayerId, TeamId};
use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// The closed set of event kinds. The delta model matches exhaustively so a
/// new kind cannot silently fall through unhandled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Goal,
    Assist,
    YellowCard,
    RedCard,
    OwnGoal,
}

impl EventKind {
    /// Only goals and own goals move the scoreboard.
    pub fn moves_scoreboard(&self) -> bool {
        matches!(self, EventKind::Goal | EventKind::OwnGoal)
    }
}

/// A single timestamped occurrence in a match's ledger.
///
/// `minute` is the stored minute: for extra-time events it is offset by the
/// regulation duration so ordering within the ledger is preserved.
/// `linked_goal_id` is set only on an assist created as a byproduct of a
/// goal; such assists are owned by their goal and never edited directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEvent {
    pub id: EventId,
    pub kind: EventKind,
    pub player_id: PlayerId,
    pub team_id: TeamId,
    pub minute: u32,
    pub linked_goal_id: Option<EventId>,
}

impl MatchEvent {
    pub fn new(kind: EventKind, player_id: PlayerId, team_id: TeamId, minute: u32) -> Self {
        MatchEvent {
            id: EventId::fresh(),
            kind,
            player_id,
            team_id,
            minute,
            linked_goal_id: None,
        }
    }

    /// The system-created assist for a goal: inherits the goal's minute,
    /// gets a fresh identifier and a back-reference to the goal.
    pub fn linked_assist(goal: &MatchEvent, assister_id: PlayerId, team_id: TeamId) -> Self {
        MatchEvent {
            id: EventId::fresh(),
            kind: EventKind::Assist,
            player_id: assister_id,
            team_id,
            minute: goal.minute,
            linked_goal_id: Some(goal.id.clone()),
        }
    }

    pub fn is_linked_assist(&self) -> bool {
        self.linked_goal_id.is_some()
    }
}

/// Validate a phase-relative minute against the match's current phase and
/// return the stored minute (offset by regulation during extra time).
pub fn stored_minute(
    minute: u32,
    timing: &MatchTiming,
    extra_time: bool,
) -> Result<u32, AppError> {
    if extra_time {
        if minute > timing.extra_time_minutes {
            return Err(AppError::Validation(format!(
                "minute {} outside extra-time range 0..={}",
                minute, timing.extra_time_minutes
            )));
        }
        Ok(timing.regulation_minutes + minute)
    } else {
        if minute > timing.regulation_minutes {
            return Err(AppError::Validation(format!(
                "minute {} outside regulation range 0..={}",
                minute, timing.regulation_minutes
            )));
        }
        Ok(minute)
    }
}
