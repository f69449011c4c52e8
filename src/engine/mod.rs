//! Pure computation for the reconciliation engine. No I/O here: these
//! functions turn events and status changes into concrete write-sets.

use crate::domain::{PlayerId, TeamId};

pub mod delta;
pub mod outcome;

pub use delta::{event_deltas, score_move};
pub use outcome::{
    finish_disposition, outcome_deltas, transition_deltas, ExtraTimeDecision, FinishDisposition,
};

/// One signed movement of one aggregate counter on one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    pub target: Target,
    pub field: StatField,
    pub amount: i64,
}

/// The document a delta lands on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Team(TeamId),
    Player(PlayerId),
}

/// Aggregate counter fields, shared between team and player documents
/// where the field name coincides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatField {
    MatchesPlayed,
    Wins,
    Draws,
    Losses,
    GoalsFor,
    GoalsAgainst,
    Goals,
    Assists,
    YellowCards,
    RedCards,
}

impl StatField {
    /// JSON pointer of this counter within its document.
    pub fn pointer(&self) -> &'static str {
        match self {
            StatField::MatchesPlayed => "/stats/matchesPlayed",
            StatField::Wins => "/stats/wins",
            StatField::Draws => "/stats/draws",
            StatField::Losses => "/stats/losses",
            StatField::GoalsFor => "/stats/goalsFor",
            StatField::GoalsAgainst => "/stats/goalsAgainst",
            StatField::Goals => "/stats/goals",
            StatField::Assists => "/stats/assists",
            StatField::YellowCards => "/stats/yellowCards",
            StatField::RedCards => "/stats/redCards",
        }
    }
}
