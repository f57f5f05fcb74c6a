use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Json,
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::contact::{self, ContactSubmission};
use crate::AppState;

use super::auth::StatusResponse;
use super::error::ApiError;
use super::rate_limit::client_address;

/// Contact form endpoint. Rate limited per client by `rate_limit_contact`.
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    conn_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(submission): Json<ContactSubmission>,
) -> Result<Json<StatusResponse>, ApiError> {
    let peer = conn_info.map(|ConnectInfo(addr)| addr);
    let client = client_address(
        &headers,
        peer.as_ref(),
        state.config.server.trust_proxy_headers,
    );

    contact::submit(&submission, &client)?;

    Ok(Json(StatusResponse::ok(
        "Thank you for your message. We will get back to you soon.",
    )))
}
