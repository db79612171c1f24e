//! Integration tests for health, status and metrics endpoints.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use stockkeeper::config::Config;
use stockkeeper::services::{TokenPurpose, TokenService};
use tower::ServiceExt;

async fn spawn_app() -> (Router, String) {
    let db_path = std::env::temp_dir().join(format!(
        "stockkeeper-system-test-{}.db",
        uuid::Uuid::new_v4()
    ));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.auth.secret_key = stockkeeper::config::generate_secret_key();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = stockkeeper::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    let user = state
        .user_service()
        .register("operator1", "password123", "ops@x.com")
        .await
        .unwrap();
    let verifier = state
        .store()
        .get_email_verifier_by_user_id(user.id)
        .await
        .unwrap()
        .unwrap();
    state.user_service().verify_email(&verifier.token).await.unwrap();

    let token = TokenService::from_config(&state.config().auth)
        .issue("operator1", TokenPurpose::Session, 60)
        .unwrap();

    (stockkeeper::api::router(state), token)
}

async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, String) {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&body).into_owned())
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = spawn_app().await;

    let (status, body) = get(&app, "/api/system/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let body_json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(body_json["success"].as_bool().unwrap_or(false));
    assert_eq!(body_json["data"]["status"], "ok");
}

#[tokio::test]
async fn test_health_ready_checks_database() {
    let (app, _) = spawn_app().await;

    let (status, body) = get(&app, "/api/system/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);

    let body_json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body_json["data"]["ready"], true);
    assert_eq!(body_json["data"]["database"], true);
}

#[tokio::test]
async fn test_health_ready_reports_closed_database() {
    let db_path = std::env::temp_dir().join(format!(
        "stockkeeper-system-test-{}.db",
        uuid::Uuid::new_v4()
    ));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.auth.secret_key = stockkeeper::config::generate_secret_key();

    let state = stockkeeper::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    state.store().conn.clone().close().await.unwrap();

    let app = stockkeeper::api::router(state);
    let (status, body) = get(&app, "/api/system/health/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let body_json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body_json["data"]["database"], false);
}

#[tokio::test]
async fn test_status_counts_users() {
    let (app, token) = spawn_app().await;

    let (status, _) = get(&app, "/api/system/status", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = get(&app, "/api/system/status", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let body_json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body_json["data"]["users"], 1);
    assert_eq!(body_json["data"]["items"], 0);
    assert_eq!(body_json["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let (app, token) = spawn_app().await;

    let (status, _) = get(&app, "/api/metrics", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = get(&app, "/api/metrics", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Metrics not enabled"));
}
