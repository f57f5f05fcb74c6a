use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::request::Parts,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::error::{ApiError, ErrorCode};
use crate::auth::{AuthGate, Claims};
use crate::AppState;

/// Session cookie name
pub const SESSION_COOKIE: &str = "admin_token";

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub username: String,
    pub role: String,
}

/// Verified admin identity from the session cookie.
///
/// Add as a handler argument to require a login; rejects with a uniform 401.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Claims);

/// Read the session cookie and verify it
pub fn session_from_jar(jar: &CookieJar, gate: &AuthGate) -> Option<Claims> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| gate.verify_token(cookie.value()))
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        session_from_jar(&jar, &state.auth)
            .map(AdminSession)
            .ok_or_else(ApiError::unauthorized)
    }
}

fn session_cookie(token: String, state: &AppState) -> Cookie<'static> {
    let max_age = time::Duration::seconds(state.auth.session_ttl().num_seconds());
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.auth.secure_cookie)
        .max_age(max_age)
        .build()
}

/// Login endpoint
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<StatusResponse>), ApiError> {
    let (username, password) = match (request.username, request.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => {
            return Err(ApiError::bad_request(
                "Username and password are required",
            ))
        }
    };

    if !state.auth.validate_credentials(&username, &password) {
        warn!("Failed admin login attempt");
        return Err(ApiError::new(ErrorCode::Unauthorized, "Invalid credentials"));
    }

    let token = state.auth.generate_token(&username)?;
    info!(username = %username, "Admin logged in");

    let jar = jar.add(session_cookie(token, &state));
    Ok((jar, Json(StatusResponse::ok("Login successful"))))
}

/// Logout endpoint. Tokens are stateless, so this only clears the cookie.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<StatusResponse>) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    (jar, Json(StatusResponse::ok("Logged out")))
}

/// Current session endpoint
pub async fn session(AdminSession(claims): AdminSession) -> Json<SessionResponse> {
    Json(SessionResponse {
        username: claims.username,
        role: claims.role,
    })
}
