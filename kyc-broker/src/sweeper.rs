//! Background expiry sweeper

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::store::{AuditStore, SessionStore};

/// Periodically delete expired sessions and prune old auth events.
/// Safe to run from several processes at once; expiry is also
/// enforced at read time, so sweep latency never extends a session.
pub async fn run<S, A>(
    session_store: Arc<S>,
    audit_store: Arc<A>,
    interval_secs: u64,
    audit_retention_days: i64,
) where
    S: SessionStore,
    A: AuditStore,
{
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        interval.tick().await;
        let now = Utc::now();

        match session_store.delete_expired(now) {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "Swept expired sessions"),
            Err(e) => tracing::warn!("Session sweep failed: {}", e),
        }

        let cutoff = now - chrono::Duration::days(audit_retention_days);
        match audit_store.prune_older_than(cutoff) {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "Pruned old auth events"),
            Err(e) => tracing::warn!("Auth event pruning failed: {}", e),
        }
    }
}
