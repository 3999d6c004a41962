//! HTTP routes for the broker

mod auth;
mod kyc;
mod reset;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::store::{AccountStore, AuditStore, SessionStore};

/// Create the router with all routes
pub fn create_router<S, A>(state: Arc<AppState<S, A>>) -> Router
where
    S: SessionStore + 'static,
    A: AccountStore + AuditStore + 'static,
{
    let max_upload = state.config.max_upload_bytes;

    Router::new()
        .route("/kyc/upload", post(kyc::upload))
        .route("/kyc/qr", post(kyc::submit_qr))
        .route("/kyc/complete", post(kyc::complete))
        .route("/kyc/status/:session_id", get(kyc::status))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/password-reset", post(reset::password_reset))
        .route("/auth/login-history", get(auth::login_history))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Caller address from the forwarding header, first hop wins
pub(crate) fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

pub(crate) fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}
