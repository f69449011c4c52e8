pub mod events;
pub mod health;
pub mod matches;
pub mod seasons;

use crate::domain::Role;
use crate::reconcile::{AuditLog, EventService, LifecycleService, StatusService};
use crate::store::DocumentStore;
use axum::http::HeaderMap;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
    pub status: StatusService,
    pub lifecycle: LifecycleService,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let audit = AuditLog::new(store.clone());
        Self {
            events: EventService::new(store.clone(), audit.clone()),
            status: StatusService::new(store.clone(), audit.clone()),
            lifecycle: LifecycleService::new(store, audit),
        }
    }
}

/// The caller's resolved role, consumed from the upstream identity layer.
/// Absent or unknown values resolve to Anonymous.
pub(crate) fn resolved_role(headers: &HeaderMap) -> Role {
    headers
        .get("x-actor-role")
        .and_then(|value| value.to_str().ok())
        .map(Role::from_label)
        .unwrap_or(Role::Anonymous)
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/v1/seasons/:season/matches/:match/events",
            get(events::list_events).post(events::add_event),
        )
        .route(
            "/v1/seasons/:season/matches/:match/events/:event",
            put(events::amend_event).delete(events::remove_event),
        )
        .route(
            "/v1/seasons/:season/matches/:match",
            delete(matches::delete_match),
        )
        .route(
            "/v1/seasons/:season/matches/:match/status",
            post(matches::set_status),
        )
        .route(
            "/v1/seasons/:season/matches/:match/finish",
            post(matches::declare_finished),
        )
        .route(
            "/v1/seasons/:season/matches/:match/extra-time",
            post(matches::resolve_extra_time),
        )
        .route("/v1/seasons", post(seasons::advance_season))
        .route("/v1/seasons/:season", delete(seasons::delete_season))
        .route("/v1/seasons/:season/reset", post(seasons::reset_stats))
        .route("/v1/seasons/:season/wipe", post(seasons::wipe_data))
        .route("/v1/seasons/:season/import", post(seasons::import_roster))
        .route(
            "/v1/seasons/:season/teams/:team/stats",
            put(seasons::override_team_stats),
        )
        .layer(cors)
        .with_state(state)
}
