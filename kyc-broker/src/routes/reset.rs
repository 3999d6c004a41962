//! Password reset by re-verification

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use kyc_core::{derive_year_of_birth, generate_password, password_hint};

use crate::audit;
use crate::error::BrokerError;
use crate::state::AppState;
use crate::store::{AccountStore, AuditStore, AuthAction, SessionStore};

#[derive(Deserialize)]
pub struct ResetRequest {
    pub qr_data: String,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub login_key: String,
    pub password_hint: String,
    pub message: String,
}

/// POST /auth/password-reset
/// Possession of the original document is the proof: a fresh scan
/// re-derives the password and replaces the stored hash. The
/// plaintext is never returned; the caller already knows how to
/// reconstruct it from their own document.
pub async fn password_reset<S, A>(
    State(state): State<Arc<AppState<S, A>>>,
    headers: HeaderMap,
    Json(req): Json<ResetRequest>,
) -> Result<Json<ResetResponse>, BrokerError>
where
    S: SessionStore,
    A: AccountStore + AuditStore + 'static,
{
    let ip = super::client_ip(&headers);
    let agent = super::user_agent(&headers);
    if !state.limits.allow(&state.limits.general, &ip) {
        return Err(BrokerError::RateLimited);
    }

    let record = state.extractor.extract(&req.qr_data)?;
    let reference = record
        .reference
        .clone()
        .ok_or_else(|| BrokerError::from(kyc_core::Error::MissingReference))?;
    let reference_hash = state.hasher.hash(&reference);

    // Reset attempts are throttled per caller and document together
    let reset_key = format!("{ip}:{}", &reference_hash[..8]);
    if !state.limits.allow(&state.limits.reset, &reset_key) {
        return Err(BrokerError::RateLimited);
    }

    let account = state
        .account_store
        .get_by_reference_hash(&reference_hash)?
        .filter(|a| a.is_active)
        .ok_or(BrokerError::AccountNotFound)?;

    let year = derive_year_of_birth(record.date_of_birth.as_deref());
    let dob = record
        .date_of_birth
        .clone()
        .unwrap_or_else(|| format!("01/01/{}", year.year));
    let password = generate_password(&record.name, &dob)?;

    let hash = bcrypt::hash(&password, crate::BCRYPT_COST)
        .map_err(|e| BrokerError::Internal(e.to_string()))?;
    state.account_store.update_password(account.id, &hash)?;

    audit::record_event(
        &state.account_store,
        Some(account.id),
        &account.login_key,
        AuthAction::PasswordReset,
        true,
        None,
        &ip,
        agent,
    );

    Ok(Json(ResetResponse {
        success: true,
        login_key: account.login_key,
        password_hint: password_hint(&record.name),
        message: "Password reset. Log in with the credential derived from your document."
            .to_string(),
    }))
}
