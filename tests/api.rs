use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use photo_contest_back::{
    config::{AppConfig, ModeConfig},
    dao::contest_store::memory::MemoryStore,
    routes,
    state::{AppState, ManualClock, SharedState},
};
use serde_json::{Value, json};
use tower::ServiceExt;

/// 2023-11-14T22:13:20Z
fn now() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

async fn app_with(config: AppConfig) -> (Router, SharedState, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(now()));
    let state = AppState::with_clock(config, clock.clone());
    state.install_store(Arc::new(MemoryStore::new())).await;
    (routes::router(state.clone()), state, clock)
}

async fn app() -> Router {
    app_with(AppConfig::default()).await.0
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn scheduled(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Spooky pictures",
        "control_mode": "scheduled",
        "start_date": "2023-11-14T00:00:00Z",
        "end_date": "2023-11-20T00:00:00Z"
    })
}

#[tokio::test]
async fn healthcheck_reports_storage() {
    let app = app().await;
    let (status, body) = send(&app, get("/healthcheck")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], true);
}

#[tokio::test]
async fn healthcheck_without_storage_is_degraded() {
    let state = AppState::new(AppConfig::default());
    let app = routes::router(state);
    let (status, body) = send(&app, get("/healthcheck")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");

    let (status, _) = send(&app, get("/api/contests")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn created_contest_reports_its_phase() {
    let app = app().await;
    let (status, body) = send(&app, post("/api/contests", scheduled("Halloween"))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Halloween");
    assert_eq!(body["control_mode"], "scheduled");
    assert_eq!(body["phase"], "active");
    assert_eq!(body["voting_open"], false);

    let (status, body) = send(&app, get("/api/contests/Halloween")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["start_date"], "2023-11-14T00:00:00Z");
}

#[tokio::test]
async fn duplicate_title_conflicts() {
    let app = app().await;
    send(&app, post("/api/contests", scheduled("Halloween"))).await;
    let (status, _) = send(&app, post("/api/contests", scheduled("Halloween"))).await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_title_is_a_bad_request() {
    let app = app().await;
    let (status, _) = send(&app, post("/api/contests", scheduled("a/b"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn manual_commands_are_refused_on_scheduled_contests() {
    let app = app().await;
    send(&app, post("/api/contests", scheduled("Halloween"))).await;

    let (status, _) = send(&app, post("/api/contests/Halloween/start", json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn listing_filters_by_phase() {
    let (app, _, clock) = app_with(AppConfig::default()).await;
    send(&app, post("/api/contests", scheduled("Halloween"))).await;
    send(
        &app,
        post("/api/contests", json!({"title": "Winter", "control_mode": "manual"})),
    )
    .await;

    let (_, body) = send(&app, get("/api/contests?phase=active")).await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|contest| contest["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Halloween"]);

    clock.advance(Duration::from_secs(7 * 86_400));
    let (_, body) = send(&app, get("/api/contests?phase=ended")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Halloween");
}

#[tokio::test]
async fn join_then_vote_flow() {
    let app = app().await;
    send(&app, post("/api/contests", scheduled("Halloween"))).await;

    let (status, body) = send(&app, get("/api/contests/Halloween/join?identity=alice%40x.com")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], true);

    let entry = json!({"identity": "Alice@X.com", "photo_ref": "photos/1.jpg"});
    let (status, body) = send(&app, post("/api/contests/Halloween/entries", entry.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["identity"], "Alice@X.com");

    let (status, body) = send(&app, post("/api/contests/Halloween/entries", entry)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], "already_joined");

    let vote = json!({"identity": "bob@x.com", "photo_ref": "photos/1.jpg"});
    let (status, body) = send(&app, post("/api/contests/Halloween/votes", vote.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "voting_closed");

    let (status, body) = send(&app, post("/api/contests/Halloween/voting/start", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["voting_open"], true);

    let (status, _) = send(&app, post("/api/contests/Halloween/votes", vote.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, post("/api/contests/Halloween/votes", vote)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], "already_voted");

    let (status, body) = send(&app, get("/api/contests/Halloween/vote?identity=bob%40x.com")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], false);
    assert_eq!(body["reason"], "already_voted");

    let (status, body) = send(&app, get("/api/contests/Halloween/votes?identity=bob%40x.com")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["photo_ref"], "photos/1.jpg");

    let (status, _) = send(&app, get("/api/contests/Halloween/votes?identity=carol%40x.com")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, get("/api/contests/Halloween/entries")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_contest_denies_with_not_found() {
    let app = app().await;
    let entry = json!({"identity": "alice@x.com", "photo_ref": "photos/1.jpg"});
    let (status, body) = send(&app, post("/api/contests/Nope/entries", entry)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["reason"], "contest_not_found");
}

#[tokio::test]
async fn deleting_a_contest_returns_no_content() {
    let app = app().await;
    send(&app, post("/api/contests", scheduled("Halloween"))).await;

    let request = Request::delete("/api/contests/Halloween")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, get("/api/contests/Halloween")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_key_guards_api_routes_only() {
    let config = AppConfig::new(ModeConfig::default(), Some("secret".into()));
    let (app, _, _) = app_with(config).await;

    let (status, _) = send(&app, get("/api/contests")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let wrong = Request::get("/api/contests")
        .header("x-api-key", "nope")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, wrong).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let right = Request::get("/api/contests")
        .header("x-api-key", "secret")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, right).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get("/healthcheck")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn mode_config_is_exposed() {
    let mode = ModeConfig {
        manual_control_default: true,
        username_only_mode: true,
        ..ModeConfig::default()
    };
    let (app, _, _) = app_with(AppConfig::new(mode, None)).await;
    let (status, body) = send(&app, get("/api/config/mode")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["manual_control_default"], true);
    assert_eq!(body["username_only_mode"], true);
    assert_eq!(body["disable_join_when_voting_starts"], false);
    assert_eq!(body["fixed_password_mode"], false);
}
