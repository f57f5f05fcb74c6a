use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use tempfile::TempDir;

use atelier::auth::hash_password;
use atelier::config::Config;
use atelier::AppState;

pub const ADMIN_USERNAME: &str = "studio";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

/// Build a test `Config` rooted in `dir`, with a fixed signing secret and
/// a hashed admin password.
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.server.data_dir = dir.path().join("data");
    config.server.public_dir = dir.path().join("public");
    config.uploads.dir = dir.path().join("public").join("portfolio");
    config.auth.admin_username = ADMIN_USERNAME.to_string();
    config.auth.admin_password_hash =
        Some(hash_password(ADMIN_PASSWORD).expect("hashing should succeed"));
    config.auth.jwt_secret = Some("integration-test-secret-0123456789abcdef".to_string());
    config
}

/// Build the full application the way `main.rs` does.
pub fn build_test_app(config: Config) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config));
    (atelier::api::create_app(state.clone()), state)
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// Build a JSON request, optionally carrying a session cookie.
pub fn json_request(
    method: &str,
    uri: &str,
    body: serde_json::Value,
    cookie: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Build a bodiless request, optionally carrying a session cookie.
pub fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Extract `name=value` of the session cookie from a login response.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("admin_token="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
