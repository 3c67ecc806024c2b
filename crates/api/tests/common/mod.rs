#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use secplan_api::auth::jwt::{generate_access_token, JwtConfig};
use secplan_api::config::ServerConfig;
use secplan_api::router::build_app_router;
use secplan_api::state::AppState;
use secplan_core::roles::Role;
use secplan_core::types::DbId;
use secplan_db::models::user::User;
use secplan_db::MemoryStore;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-with-enough-entropy";

/// Build a test `ServerConfig` with safe defaults and no bootstrap admin.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: "postgres://unused".to_string(),
        db_max_connections: 1,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_expiry_mins: 60,
        },
        bootstrap_admin: None,
    }
}

/// The full application router over a seeded in-memory store.
///
/// The store is returned so tests can arrange users and inspect state.
pub fn build_test_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::seeded());
    let config = test_config();
    let state = AppState::new(store.clone(), store.clone(), config.clone());
    (build_app_router(state, &config), store)
}

/// Users of every role, created in the store.
pub struct Team {
    pub admin: User,
    pub coordinator: User,
    pub designer: User,
    pub other_user: User,
}

impl Team {
    pub fn create(store: &MemoryStore) -> Self {
        Self {
            admin: store.add_user("admin@municipio.cl", "Ana Admin", Role::Admin, "x"),
            coordinator: store.add_user(
                "coordinacion@municipio.cl",
                "Carlos Coordinador",
                Role::Coordinator,
                "x",
            ),
            designer: store.add_user("disena@municipio.cl", "Daniela Diseño", Role::User, "x"),
            other_user: store.add_user("otro@municipio.cl", "Óscar Otro", Role::User, "x"),
        }
    }
}

/// A valid access token for `user`, signed with the test secret.
pub fn token_for(user: &User) -> String {
    let role = user.role().expect("test users have valid roles");
    token(user.id, role)
}

pub fn token(user_id: DbId, role: Role) -> String {
    generate_access_token(user_id, role, &test_config().jwt).expect("token generation")
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::POST, uri, None, body).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_request(app, Method::POST, uri, Some(token), body).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_request(app, Method::PUT, uri, Some(token), body).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_request(app, Method::PATCH, uri, Some(token), body).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("response body is JSON")
}
