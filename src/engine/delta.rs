//! The delta model: which counters an event moves, and by how much.
//!
//! Pure mapping from `(event, factor)` to a write-set. Reversal is the same
//! mapping with factor -1, which is what makes ledger edits symmetric.

use crate::domain::{EventKind, MatchEvent, Side, TeamId};
use crate::engine::{Delta, StatField, Target};

/// Counter movement for one event. `opponent` is the other side's team;
/// `factor` is +1 on application and -1 on reversal.
pub fn event_deltas(event: &MatchEvent, opponent: &TeamId, factor: i64) -> Vec<Delta> {
    let player = Target::Player(event.player_id.clone());
    let team = Target::Team(event.team_id.clone());
    let opponent = Target::Team(opponent.clone());

    match event.kind {
        EventKind::Goal => vec![
            Delta {
                target: player,
                field: StatField::Goals,
                amount: factor,
            },
            Delta {
                target: team,
                field: StatField::GoalsFor,
                amount: factor,
            },
            Delta {
                target: opponent,
                field: StatField::GoalsAgainst,
                amount: factor,
            },
        ],
        EventKind::Assist => vec![
            Delta {
                target: player,
                field: StatField::Assists,
                amount: factor,
            },
            Delta {
                target: team,
                field: StatField::Assists,
                amount: factor,
            },
        ],
        EventKind::YellowCard => vec![
            Delta {
                target: player,
                field: StatField::YellowCards,
                amount: factor,
            },
            Delta {
                target: team,
                field: StatField::YellowCards,
                amount: factor,
            },
        ],
        EventKind::RedCard => vec![
            Delta {
                target: player,
                field: StatField::RedCards,
                amount: factor,
            },
            Delta {
                target: team,
                field: StatField::RedCards,
                amount: factor,
            },
        ],
        // Own goals never credit a personal tally.
        EventKind::OwnGoal => vec![
            Delta {
                target: team,
                field: StatField::GoalsAgainst,
                amount: factor,
            },
            Delta {
                target: opponent,
                field: StatField::GoalsFor,
                amount: factor,
            },
        ],
    }
}

/// Scoreboard movement for one event: a goal credits the scorer's side, an
/// own goal the opposing side. Returns the side whose score moves and the
/// signed amount.
pub fn score_move(kind: EventKind, event_side: Side, factor: i64) -> Option<(Side, i64)> {
    match kind {
        EventKind::Goal => Some((event_side, factor)),
        EventKind::OwnGoal => Some((event_side.opposite(), factor)),
        EventKind::Assist | EventKind::YellowCard | EventKind::RedCard => None,
    }
}
