//! Domain types for the season-partitioned competition ledger.
//!
//! This module provides:
//! - Newtype identifiers minted as UUIDs
//! - Document types stored per season partition: Team, Player, Match
//! - The closed MatchEvent kind enum consumed by the delta model
//! - Season records and the explicit SeasonContext threaded into operations

pub mod event;
pub mod ids;
pub mod matches;
pub mod player;
pub mod role;
pub mod season;
pub mod team;

pub use event::{stored_minute, EventKind, MatchEvent};
pub use ids::{EventId, MatchId, PlayerId, SeasonId, TeamId};
pub use matches::{Match, MatchStatus, Side, Stage, EVENTS_FIELD, EXTRA_TIME_FIELD, STATUS_FIELD};
pub use player::{Player, PlayerStats};
pub use role::Role;
pub use season::{AppConfig, MatchTiming, Season, SeasonContext};
pub use team::{Team, TeamStats};
