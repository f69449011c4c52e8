//! Outcome reconciliation: win/draw/loss movement when a match crosses into
//! or out of finished, and the extra-time decision protocol.

use crate::domain::{Stage, TeamId};
use crate::engine::{Delta, StatField, Target};
use serde::{Deserialize, Serialize};

/// What declaring a live match finished resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishDisposition {
    /// Record the outcome and finish.
    Finish,
    /// Scores are level in a knockout match with no extra time played yet;
    /// the caller must decide between a draw and extra time.
    AwaitExtraTimeDecision,
}

/// The caller's answer to `AwaitExtraTimeDecision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraTimeDecision {
    ConcludeDraw,
    InitiateExtraTime,
}

/// Decide whether a live match can finish directly.
pub fn finish_disposition(
    stage: Stage,
    home_score: i64,
    away_score: i64,
    extra_time: bool,
) -> FinishDisposition {
    if home_score == away_score && !stage.is_group() && !extra_time {
        FinishDisposition::AwaitExtraTimeDecision
    } else {
        FinishDisposition::Finish
    }
}

/// W/D/L and matches-played movement for one finished outcome. `factor` +1
/// records the outcome, -1 reverses a previously recorded one.
pub fn outcome_deltas(
    home_team: &TeamId,
    away_team: &TeamId,
    home_score: i64,
    away_score: i64,
    factor: i64,
) -> Vec<Delta> {
    let home = Target::Team(home_team.clone());
    let away = Target::Team(away_team.clone());

    let (home_result, away_result) = if home_score > away_score {
        (StatField::Wins, StatField::Losses)
    } else if home_score < away_score {
        (StatField::Losses, StatField::Wins)
    } else {
        (StatField::Draws, StatField::Draws)
    };

    vec![
        Delta {
            target: home.clone(),
            field: StatField::MatchesPlayed,
            amount: factor,
        },
        Delta {
            target: home,
            field: home_result,
            amount: factor,
        },
        Delta {
            target: away.clone(),
            field: StatField::MatchesPlayed,
            amount: factor,
        },
        Delta {
            target: away,
            field: away_result,
            amount: factor,
        },
    ]
}

/// Outcome movement for a status change that may enter and/or leave
/// finished in one update. The reversal uses the score recorded with the
/// old outcome and the application uses the new score, never a mixed pair.
#[allow(clippy::too_many_arguments)]
pub fn transition_deltas(
    home_team: &TeamId,
    away_team: &TeamId,
    was_finished: bool,
    now_finished: bool,
    old_score: (i64, i64),
    new_score: (i64, i64),
) -> Vec<Delta> {
    let mut deltas = Vec::new();
    if was_finished {
        deltas.extend(outcome_deltas(
            home_team, away_team, old_score.0, old_score.1, -1,
        ));
    }
    if now_finished {
        deltas.extend(outcome_deltas(
            home_team, away_team, new_score.0, new_score.1, 1,
        ));
    }
    deltas
}
