//! Data models for broker storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

/// Unique verification session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(format!("kyc_{}", uuid::Uuid::new_v4()))
    }
}

/// Lifecycle of a verification session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Pending,
    Parsed,
    Completed,
    Rejected,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "PENDING",
            SessionStatus::Parsed => "PARSED",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(SessionStatus::Pending),
            "PARSED" => Some(SessionStatus::Parsed),
            "COMPLETED" => Some(SessionStatus::Completed),
            "REJECTED" => Some(SessionStatus::Rejected),
            _ => None,
        }
    }
}

/// Extracted attributes held only while a session is open. Cleared on
/// completion so the plaintext credential is handed out exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTemp {
    pub name: String,
    pub date_of_birth: Option<String>,
    pub gender: String,
    pub year_of_birth: i32,
    pub synthetic_year: bool,
    pub masked_address: String,
    pub login_key: String,
    pub password: String,
    pub password_hint: String,
}

/// A verification session
#[derive(Debug, Clone)]
pub struct VerificationSession {
    pub id: SessionId,
    /// Where the payload came from ("upload" or "qr")
    pub source: String,
    pub status: SessionStatus,
    pub temp: Option<SessionTemp>,
    pub reference_hash: Option<String>,
    pub reference_preview: Option<String>,
    pub account_id: Option<AccountId>,
    pub client_ip: String,
    pub user_agent: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl VerificationSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// An issued account
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub reference_hash: String,
    pub reference_preview: String,
    pub name: String,
    pub login_key: String,
    pub year_of_birth: i32,
    pub year_of_birth_synthetic: bool,
    pub gender: String,
    pub masked_address: String,
    pub password_hash: String,
    /// Placeholder address, unique per account
    pub contact_email: String,
    pub kyc_source: String,
    pub kyc_verified_at: DateTime<Utc>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create (or re-anchor) an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub reference_hash: String,
    pub reference_preview: String,
    pub name: String,
    pub login_key: String,
    pub year_of_birth: i32,
    pub year_of_birth_synthetic: bool,
    pub gender: String,
    pub masked_address: String,
    pub password_hash: String,
    pub kyc_source: String,
}

/// What an auth event records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    LoginSuccess,
    LoginFailure,
    PasswordReset,
    KycCompleted,
}

impl AuthAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthAction::LoginSuccess => "login_success",
            AuthAction::LoginFailure => "login_failure",
            AuthAction::PasswordReset => "password_reset",
            AuthAction::KycCompleted => "kyc_completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "login_success" => Some(AuthAction::LoginSuccess),
            "login_failure" => Some(AuthAction::LoginFailure),
            "password_reset" => Some(AuthAction::PasswordReset),
            "kyc_completed" => Some(AuthAction::KycCompleted),
            _ => None,
        }
    }
}

/// One append-only audit log entry
#[derive(Debug, Clone)]
pub struct AuthEvent {
    pub account_id: Option<AccountId>,
    pub login_key: String,
    pub action: AuthAction,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub ip: String,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}
