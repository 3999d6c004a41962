//! Verification pipeline endpoints

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use kyc_core::{
    generate_password, login_key, normalize_record, password_hint, IdentityRecord,
    ReferenceHasher,
};

use crate::audit;
use crate::error::BrokerError;
use crate::state::AppState;
use crate::store::{
    AccountStore, AuditStore, AuthAction, NewAccount, SessionId, SessionStatus, SessionStore,
    SessionTemp, VerificationSession,
};

#[derive(Serialize)]
pub struct ExtractedInfo {
    pub name: String,
    pub dob: String,
    pub gender: String,
    pub address: String,
    pub login_key: String,
    pub password_hint: String,
}

#[derive(Serialize)]
pub struct KycSubmitResponse {
    pub success: bool,
    pub session_id: String,
    pub user_exists: bool,
    pub extracted_info: ExtractedInfo,
}

/// POST /kyc/upload
/// Multipart image upload carrying a QR code
pub async fn upload<S, A>(
    State(state): State<Arc<AppState<S, A>>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<KycSubmitResponse>, BrokerError>
where
    S: SessionStore,
    A: AccountStore + AuditStore + 'static,
{
    let ip = super::client_ip(&headers);
    if !state.limits.allow(&state.limits.kyc, &ip) {
        return Err(BrokerError::RateLimited);
    }

    let mut image: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| BrokerError::ValidationError(e.to_string()))?
    {
        if matches!(field.name(), Some("image") | Some("file")) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| BrokerError::ValidationError(e.to_string()))?;
            image = Some(bytes.to_vec());
            break;
        }
    }
    let image = image
        .ok_or_else(|| BrokerError::ValidationError("missing image field".to_string()))?;

    if image.len() > state.config.max_upload_bytes {
        return Err(BrokerError::InvalidImage("image too large".to_string()));
    }

    // QR detection is CPU-heavy, keep it off the async workers
    let (result, seed) = tokio::task::spawn_blocking(move || {
        let result = kyc_core::extract_image(&image);
        (result, image)
    })
    .await
    .map_err(|e| BrokerError::Internal(e.to_string()))?;
    process(&state, "upload", result, &seed, ip, super::user_agent(&headers))
}

#[derive(Deserialize)]
pub struct QrRequest {
    pub qr_data: String,
}

/// POST /kyc/qr
/// Raw QR payload as text
pub async fn submit_qr<S, A>(
    State(state): State<Arc<AppState<S, A>>>,
    headers: HeaderMap,
    Json(req): Json<QrRequest>,
) -> Result<Json<KycSubmitResponse>, BrokerError>
where
    S: SessionStore,
    A: AccountStore + AuditStore + 'static,
{
    let ip = super::client_ip(&headers);
    if !state.limits.allow(&state.limits.kyc, &ip) {
        return Err(BrokerError::RateLimited);
    }

    let result = state.extractor.extract(&req.qr_data);
    process(
        &state,
        "qr",
        result,
        req.qr_data.as_bytes(),
        ip,
        super::user_agent(&headers),
    )
}

/// Shared pipeline: extraction result -> normalized attributes ->
/// credentials -> open PARSED session. The plaintext reference never
/// leaves this function.
fn process<S, A>(
    state: &AppState<S, A>,
    source: &str,
    result: kyc_core::Result<IdentityRecord>,
    demo_seed: &[u8],
    ip: String,
    user_agent: Option<String>,
) -> Result<Json<KycSubmitResponse>, BrokerError>
where
    S: SessionStore,
    A: AccountStore + AuditStore,
{
    let record = match result {
        Ok(record) => record,
        Err(e) if state.config.demo_mode => {
            tracing::warn!("Extraction failed ({}), demo mode fabricating a record", e);
            demo_record(&state.hasher, demo_seed)
        }
        Err(e) => return Err(e.into()),
    };

    let reference = match record.reference.clone() {
        Some(reference) => reference,
        None if state.config.demo_mode => pseudo_reference(&state.hasher, demo_seed),
        None => return Err(kyc_core::Error::MissingReference.into()),
    };

    let attrs = normalize_record(&record);
    // Year-only and synthetic fallbacks get a pinned January 1st
    let dob = record
        .date_of_birth
        .clone()
        .unwrap_or_else(|| format!("01/01/{}", attrs.year_of_birth.year));

    let password = generate_password(&record.name, &dob)?;
    let key = login_key(&record.name);
    let hint = password_hint(&record.name);

    let reference_hash = state.hasher.hash(&reference);
    let reference_preview = ReferenceHasher::preview(&reference);
    let user_exists = state
        .account_store
        .get_by_reference_hash(&reference_hash)?
        .is_some();

    let now = Utc::now();
    let session = VerificationSession {
        id: SessionId::generate(),
        source: source.to_string(),
        status: SessionStatus::Parsed,
        temp: Some(SessionTemp {
            name: attrs.name.clone(),
            date_of_birth: Some(dob.clone()),
            gender: attrs.gender.as_str().to_string(),
            year_of_birth: attrs.year_of_birth.year,
            synthetic_year: attrs.year_of_birth.synthetic,
            masked_address: attrs.masked_address.clone(),
            login_key: key.clone(),
            password,
            password_hint: hint.clone(),
        }),
        reference_hash: Some(reference_hash),
        reference_preview: Some(reference_preview),
        account_id: None,
        client_ip: ip,
        user_agent,
        error_message: None,
        created_at: now,
        expires_at: now + chrono::Duration::seconds(state.config.session_ttl_secs),
    };
    let session_id = session.id.0.clone();
    state.session_store.create(session)?;

    tracing::info!(session_id = %session_id, source, "Opened verification session");

    Ok(Json(KycSubmitResponse {
        success: true,
        session_id,
        user_exists,
        extracted_info: ExtractedInfo {
            name: attrs.name,
            dob,
            gender: attrs.gender.as_str().to_string(),
            address: attrs.masked_address,
            login_key: key,
            password_hint: hint,
        },
    }))
}

/// Deterministic stand-in record for demo mode: the same payload
/// always maps to the same identity.
fn demo_record(hasher: &ReferenceHasher, seed: &[u8]) -> IdentityRecord {
    let digest = hasher.hash(&String::from_utf8_lossy(seed));
    IdentityRecord {
        name: format!("Demo User {}", digest[..4].to_uppercase()),
        date_of_birth: Some("01/01/1990".to_string()),
        gender: "M".to_string(),
        address: "Demo Colony, New Delhi, 110001".to_string(),
        reference: Some(pseudo_reference(hasher, seed)),
    }
}

fn pseudo_reference(hasher: &ReferenceHasher, seed: &[u8]) -> String {
    let digest = hasher.hash(&String::from_utf8_lossy(seed));
    let mut digits: String = digest.chars().filter(|c| c.is_ascii_digit()).take(12).collect();
    while digits.len() < 12 {
        digits.push('0');
    }
    digits
}

#[derive(Deserialize)]
pub struct CompleteRequest {
    pub session_id: String,
    #[serde(default)]
    pub accept_terms: bool,
}

#[derive(Serialize)]
pub struct CompleteResponse {
    pub success: bool,
    pub account_id: u64,
    pub login_key: String,
    /// Returned exactly once; only the bcrypt hash survives
    pub generated_password: String,
    pub is_new_user: bool,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// POST /kyc/complete
pub async fn complete<S, A>(
    State(state): State<Arc<AppState<S, A>>>,
    headers: HeaderMap,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<CompleteResponse>, BrokerError>
where
    S: SessionStore,
    A: AccountStore + AuditStore + 'static,
{
    let ip = super::client_ip(&headers);
    if !state.limits.allow(&state.limits.general, &ip) {
        return Err(BrokerError::RateLimited);
    }

    let now = Utc::now();
    let session_id = SessionId(req.session_id.clone());
    let session = state
        .session_store
        .get(&session_id)?
        .ok_or(BrokerError::SessionInvalidOrExpired)?;

    if session.status != SessionStatus::Parsed || session.is_expired(now) {
        return Err(BrokerError::SessionInvalidOrExpired);
    }

    let temp = session
        .temp
        .as_ref()
        .ok_or(BrokerError::SessionInvalidOrExpired)?;
    let reference_hash = session
        .reference_hash
        .clone()
        .ok_or(BrokerError::SessionInvalidOrExpired)?;

    let existing = state
        .account_store
        .get_by_reference_hash(&reference_hash)?;
    if existing.is_none() && !req.accept_terms {
        return Err(BrokerError::TermsNotAccepted);
    }

    let password_hash = bcrypt::hash(&temp.password, crate::BCRYPT_COST)
        .map_err(|e| BrokerError::Internal(e.to_string()))?;

    let (account, is_new_user) = state.account_store.find_or_create(
        NewAccount {
            reference_hash,
            reference_preview: session.reference_preview.clone().unwrap_or_default(),
            name: temp.name.clone(),
            login_key: temp.login_key.clone(),
            year_of_birth: temp.year_of_birth,
            year_of_birth_synthetic: temp.synthetic_year,
            gender: temp.gender.clone(),
            masked_address: temp.masked_address.clone(),
            password_hash,
            kyc_source: session.source.clone(),
        },
        now,
    )?;

    // The atomic status guard makes this fail for a concurrent retry
    let completed = state
        .session_store
        .complete(&session_id, account.id, now)?;
    let temp = completed
        .temp
        .ok_or(BrokerError::SessionInvalidOrExpired)?;

    audit::record_event(
        &state.account_store,
        Some(account.id),
        &account.login_key,
        AuthAction::KycCompleted,
        true,
        None,
        &ip,
        super::user_agent(&headers),
    );

    let pair = state.tokens.issue_pair(account.id.0, &account.login_key)?;

    Ok(Json(CompleteResponse {
        success: true,
        account_id: account.id.0,
        login_key: account.login_key,
        generated_password: temp.password,
        is_new_user,
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        expires_in: pair.expires_in,
    }))
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub session_id: String,
    pub status: String,
    pub expired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_info: Option<StatusInfo>,
}

#[derive(Serialize)]
pub struct StatusInfo {
    pub name: String,
    pub gender: String,
    pub address: String,
    pub login_key: String,
    pub password_hint: String,
}

/// GET /kyc/status/:session_id
/// Masked progress view; never carries the generated password
pub async fn status<S, A>(
    State(state): State<Arc<AppState<S, A>>>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> Result<Json<StatusResponse>, BrokerError>
where
    S: SessionStore,
    A: AccountStore + AuditStore,
{
    let ip = super::client_ip(&headers);
    if !state.limits.allow(&state.limits.general, &ip) {
        return Err(BrokerError::RateLimited);
    }

    let session = state
        .session_store
        .get(&SessionId(session_id))?
        .ok_or(BrokerError::SessionInvalidOrExpired)?;

    let expired = session.is_expired(Utc::now());
    Ok(Json(StatusResponse {
        success: true,
        session_id: session.id.0,
        status: session.status.as_str().to_string(),
        expired,
        reference_preview: session.reference_preview,
        extracted_info: session.temp.map(|temp| StatusInfo {
            name: temp.name,
            gender: temp.gender,
            address: temp.masked_address,
            login_key: temp.login_key,
            password_hint: temp.password_hint,
        }),
    }))
}
