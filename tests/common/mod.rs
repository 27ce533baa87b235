use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use tasks_api::{app_state::AppState, build_app, settings::{DatabaseSettings, Settings}};

pub const UNREACHABLE_DATABASE: &str = "sqlite:///nonexistent/dir/tasks.db";

pub fn settings_for(url: &str, mount_path: &str) -> Settings {
    Settings {
        mount_path: mount_path.to_string(),
        database: DatabaseSettings::with_url(url),
        ..Settings::default()
    }
}

/// Fresh application over its own in-memory database.
pub fn create_test_app() -> Router {
    create_app_with(settings_for("sqlite::memory:", ""))
}

pub fn create_app_with(settings: Settings) -> Router {
    build_app(AppState::shared(settings).unwrap())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    TestResponse { status, headers, body }
}

pub async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    };
    send(app, request.unwrap()).await
}

/// Creates a task and returns its id.
pub async fn create_task(app: &Router, body: Value) -> i64 {
    let response = call(app, "POST", "/tasks", Some(body)).await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.json()["data"]["id"].as_i64().unwrap()
}
