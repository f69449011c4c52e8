use axum::http::{Request, StatusCode};
use chrono::Utc;
use clubledger::api::{self, AppState};
use clubledger::domain::{
    AppConfig, Match, MatchStatus, MatchTiming, Player, Season, SeasonContext, SeasonId, Stage,
    Team,
};
use clubledger::store::paths;
use clubledger::{init_store, DocumentStore, SqliteStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    router: axum::Router,
    store: Arc<SqliteStore>,
    ctx: SeasonContext,
    match_id: String,
    scorer_id: String,
    assister_id: String,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_store(&db_path).await.expect("init_store failed");
    let store = Arc::new(SqliteStore::new(pool));

    let season_id = SeasonId::new("s1".to_string());
    let mut season = Season::new(
        "2026".to_string(),
        2026,
        MatchTiming::default(),
        Utc::now(),
    );
    season.id = season_id.clone();
    let config = AppConfig {
        current_season_id: Some(season_id.clone()),
        seasons: vec![season],
        logging_enabled: false,
    };

    let home = Team::new("Home".to_string(), "H".to_string());
    let away = Team::new("Away".to_string(), "A".to_string());
    let scorer = Player::new(home.id.clone(), "Nine".to_string());
    let assister = Player::new(home.id.clone(), "Ten".to_string());
    let mut match_doc = Match::new(
        home.id.clone(),
        away.id.clone(),
        Utc::now(),
        Stage::SemiFinal,
    )
    .unwrap();
    match_doc.status = MatchStatus::Live;

    let mut batch = clubledger::WriteBatch::new();
    batch
        .set(paths::APP_CONFIG, serde_json::to_value(&config).unwrap())
        .set(
            paths::team(&season_id, &home.id),
            serde_json::to_value(&home).unwrap(),
        )
        .set(
            paths::team(&season_id, &away.id),
            serde_json::to_value(&away).unwrap(),
        )
        .set(
            paths::player(&season_id, &scorer.id),
            serde_json::to_value(&scorer).unwrap(),
        )
        .set(
            paths::player(&season_id, &assister.id),
            serde_json::to_value(&assister).unwrap(),
        )
        .set(
            paths::match_doc(&season_id, &match_doc.id),
            serde_json::to_value(&match_doc).unwrap(),
        );
    store.commit(batch).await.unwrap();

    let router = api::create_router(AppState::new(store.clone()));
    TestApp {
        router,
        store,
        ctx: SeasonContext::new(season_id),
        match_id: match_doc.id.as_str().to_string(),
        scorer_id: scorer.id.as_str().to_string(),
        assister_id: assister.id.as_str().to_string(),
        _temp: temp_dir,
    }
}

impl TestApp {
    async fn request(
        &self,
        method: &str,
        uri: &str,
        role: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(role) = role {
            builder = builder.header("x-actor-role", role);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(axum::body::Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(axum::body::Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_test_app().await;
    let (status, body) = app.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_add_event_as_staff() {
    let app = setup_test_app().await;
    let uri = format!("/v1/seasons/s1/matches/{}/events", app.match_id);

    let (status, body) = app
        .request(
            "POST",
            &uri,
            Some("staff"),
            Some(json!({
                "kind": "goal",
                "playerId": app.scorer_id,
                "minute": 12,
                "assisterId": app.assister_id,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "goal");
    assert_eq!(body["minute"], 12);

    let (status, body) = app.request("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1]["kind"], "assist");
    assert_eq!(events[1]["linkedGoalId"], events[0]["id"]);
}

#[tokio::test]
async fn test_anonymous_caller_gets_403() {
    let app = setup_test_app().await;
    let uri = format!("/v1/seasons/s1/matches/{}/events", app.match_id);

    let (status, _) = app
        .request(
            "POST",
            &uri,
            None,
            Some(json!({
                "kind": "goal",
                "playerId": app.scorer_id,
                "minute": 12,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_out_of_range_minute_gets_422_with_range() {
    let app = setup_test_app().await;
    let uri = format!("/v1/seasons/s1/matches/{}/events", app.match_id);

    let (status, body) = app
        .request(
            "POST",
            &uri,
            Some("staff"),
            Some(json!({
                "kind": "goal",
                "playerId": app.scorer_id,
                "minute": 120,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("0..=90"));
}

#[tokio::test]
async fn test_unknown_match_gets_404() {
    let app = setup_test_app().await;

    let (status, _) = app
        .request(
            "POST",
            "/v1/seasons/s1/matches/nope/events",
            Some("staff"),
            Some(json!({
                "kind": "goal",
                "playerId": app.scorer_id,
                "minute": 12,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_finish_flow_signals_pending_decision() {
    let app = setup_test_app().await;

    // Level semi-final: finishing must signal the pending decision.
    let uri = format!("/v1/seasons/s1/matches/{}/finish", app.match_id);
    let (status, body) = app.request("POST", &uri, Some("staff"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "extra_time_pending");
    assert_eq!(body["awaitingExtraTimeDecision"], true);

    // Conclude as a draw.
    let uri = format!("/v1/seasons/s1/matches/{}/extra-time", app.match_id);
    let (status, body) = app
        .request(
            "POST",
            &uri,
            Some("staff"),
            Some(json!({"decision": "conclude_draw"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "finished");

    let m: Match = app
        .store
        .get(&paths::match_doc(
            &app.ctx.season_id,
            &clubledger::domain::MatchId::new(app.match_id.clone()),
        ))
        .await
        .unwrap()
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(m.status, MatchStatus::Finished);
}

#[tokio::test]
async fn test_lifecycle_endpoints_are_owner_only() {
    let app = setup_test_app().await;

    let (status, _) = app
        .request("POST", "/v1/seasons/s1/reset", Some("staff"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request("POST", "/v1/seasons/s1/reset", Some("owner"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_import_endpoint_requires_known_source() {
    let app = setup_test_app().await;

    let (status, _) = app
        .request(
            "POST",
            "/v1/seasons/s1/import",
            Some("owner"),
            Some(json!({"sourceSeasonId": "ghost"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_override_team_stats_endpoint() {
    let app = setup_test_app().await;
    let teams = app
        .store
        .list(&paths::teams_prefix(&app.ctx.season_id))
        .await
        .unwrap();
    let team: Team = teams[0].decode().unwrap();

    let uri = format!("/v1/seasons/s1/teams/{}/stats", team.id.as_str());
    let (status, body) = app
        .request(
            "PUT",
            &uri,
            Some("owner"),
            Some(json!({
                "matchesPlayed": 5,
                "wins": 2,
                "draws": 1,
                "losses": 1,
                "goalsFor": 9,
                "goalsAgainst": 4,
                "assists": 6,
                "yellowCards": 3,
                "redCards": 0,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["goalsFor"], 9);
    // The override is allowed to diverge from played = won + drawn + lost.
    assert_eq!(body["stats"]["matchesPlayed"], 5);
}
