//! Authentication endpoints

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit;
use crate::error::BrokerError;
use crate::state::AppState;
use crate::store::{AccountId, AccountStore, AuditStore, AuthAction, SessionStore};
use crate::tokens::{TOKEN_TYPE_ACCESS, TOKEN_TYPE_REFRESH};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub login_key: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AccountSummary {
    pub account_id: u64,
    pub name: String,
    pub login_key: String,
    pub year_of_birth: i32,
    pub gender: String,
    pub reference_preview: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub account: AccountSummary,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// POST /auth/login
/// Unknown key and wrong password answer identically; the audit log
/// keeps the distinction.
pub async fn login<S, A>(
    State(state): State<Arc<AppState<S, A>>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, BrokerError>
where
    S: SessionStore,
    A: AccountStore + AuditStore + 'static,
{
    let ip = super::client_ip(&headers);
    let agent = super::user_agent(&headers);
    if !state.limits.allow(&state.limits.login, &ip) {
        return Err(BrokerError::RateLimited);
    }

    let key = req.login_key.trim().to_uppercase();
    let candidates = state.account_store.list_active_by_login_key(&key)?;

    let mut matched = None;
    for account in candidates {
        // The key is derivable from the stored name; a mismatch means
        // a corrupted row and must never authenticate
        if kyc_core::login_key(&account.name) != account.login_key {
            tracing::warn!(account_id = account.id.0, "Login key does not match stored name");
            continue;
        }
        if bcrypt::verify(&req.password, &account.password_hash)
            .map_err(|e| BrokerError::Internal(e.to_string()))?
        {
            matched = Some(account);
            break;
        }
    }

    let Some(account) = matched else {
        audit::record_event(
            &state.account_store,
            None,
            &key,
            AuthAction::LoginFailure,
            false,
            Some("invalid credentials".to_string()),
            &ip,
            agent,
        );
        return Err(BrokerError::AuthFailed);
    };

    let now = Utc::now();
    state.account_store.touch_login(account.id, now)?;
    audit::record_event(
        &state.account_store,
        Some(account.id),
        &account.login_key,
        AuthAction::LoginSuccess,
        true,
        None,
        &ip,
        agent,
    );

    let pair = state.tokens.issue_pair(account.id.0, &account.login_key)?;

    Ok(Json(LoginResponse {
        success: true,
        account: AccountSummary {
            account_id: account.id.0,
            name: account.name,
            login_key: account.login_key,
            year_of_birth: account.year_of_birth,
            gender: account.gender,
            reference_preview: account.reference_preview,
        },
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        expires_in: pair.expires_in,
    }))
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// POST /auth/refresh
pub async fn refresh<S, A>(
    State(state): State<Arc<AppState<S, A>>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, BrokerError>
where
    S: SessionStore,
    A: AccountStore + AuditStore,
{
    let claims = state.tokens.verify(&req.refresh_token, TOKEN_TYPE_REFRESH)?;

    let account = state
        .account_store
        .get(AccountId(claims.sub))?
        .filter(|a| a.is_active && a.login_key == claims.login_key)
        .ok_or(BrokerError::AuthFailed)?;

    let pair = state.tokens.issue_pair(account.id.0, &account.login_key)?;

    Ok(Json(RefreshResponse {
        success: true,
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        expires_in: pair.expires_in,
    }))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    20
}

#[derive(Serialize)]
pub struct HistoryEntry {
    pub action: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub events: Vec<HistoryEntry>,
}

/// GET /auth/login-history
/// Bearer-authenticated, newest first
pub async fn login_history<S, A>(
    State(state): State<Arc<AppState<S, A>>>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, BrokerError>
where
    S: SessionStore,
    A: AccountStore + AuditStore,
{
    let token = super::bearer_token(&headers).ok_or(BrokerError::AuthFailed)?;
    let claims = state.tokens.verify(&token, TOKEN_TYPE_ACCESS)?;

    let account = state
        .account_store
        .get(AccountId(claims.sub))?
        .filter(|a| a.is_active)
        .ok_or(BrokerError::AuthFailed)?;

    let limit = query.limit.min(100);
    let events = state
        .account_store
        .list_for_account(account.id, limit, query.offset)?;

    Ok(Json(HistoryResponse {
        success: true,
        events: events
            .into_iter()
            .map(|e| HistoryEntry {
                action: e.action.as_str().to_string(),
                success: e.success,
                failure_reason: e.failure_reason,
                ip: e.ip,
                user_agent: e.user_agent,
                created_at: e.created_at,
            })
            .collect(),
    }))
}
