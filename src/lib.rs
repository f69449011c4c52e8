pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod reconcile;
pub mod store;

pub use config::Config;
pub use domain::{
    EventKind, Match, MatchEvent, MatchStatus, Player, Role, Season, SeasonContext, Side, Stage,
    Team,
};
pub use error::AppError;
pub use reconcile::{AuditLog, EventService, LifecycleService, StatusService};
pub use store::{init_store, DocumentStore, MemoryStore, SqliteStore, WriteBatch};
