//! Fire-and-forget auth event logging

use std::sync::Arc;

use chrono::Utc;

use crate::store::{AccountId, AuditStore, AuthAction, AuthEvent};

/// Write an auth event on a spawned task. A failed write is logged
/// and never surfaces to the request that triggered it.
pub fn record_event<A>(
    store: &Arc<A>,
    account_id: Option<AccountId>,
    login_key: &str,
    action: AuthAction,
    success: bool,
    failure_reason: Option<String>,
    ip: &str,
    user_agent: Option<String>,
) where
    A: AuditStore + Send + Sync + 'static,
{
    let store = Arc::clone(store);
    let event = AuthEvent {
        account_id,
        login_key: login_key.to_string(),
        action,
        success,
        failure_reason,
        ip: ip.to_string(),
        user_agent,
        created_at: Utc::now(),
    };

    tokio::spawn(async move {
        if let Err(e) = store.record(event) {
            tracing::warn!("Failed to record auth event: {}", e);
        }
    });
}
