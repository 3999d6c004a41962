//! Broker error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Could not read identity data from the document: {0}")]
    ExtractionFailed(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Could not generate credentials: {0}")]
    CredentialGeneration(String),

    #[error("Session is invalid or has expired")]
    SessionInvalidOrExpired,

    #[error("Terms and conditions must be accepted")]
    TermsNotAccepted,

    #[error("Invalid credentials")]
    AuthFailed,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Too many requests")]
    RateLimited,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<kyc_core::Error> for BrokerError {
    fn from(e: kyc_core::Error) -> Self {
        match e {
            kyc_core::Error::InvalidImage(msg) => BrokerError::InvalidImage(msg),
            kyc_core::Error::NoFormatMatched => BrokerError::ExtractionFailed(
                "unrecognized document format".to_string(),
            ),
            kyc_core::Error::InvalidDate(msg) => {
                BrokerError::CredentialGeneration(format!("invalid date of birth: {msg}"))
            }
            kyc_core::Error::InvalidName => {
                BrokerError::CredentialGeneration("name missing from document".to_string())
            }
            kyc_core::Error::MissingReference => BrokerError::ExtractionFailed(
                "no reference number in document".to_string(),
            ),
        }
    }
}

impl IntoResponse for BrokerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            BrokerError::ExtractionFailed(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            BrokerError::InvalidImage(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            BrokerError::CredentialGeneration(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            BrokerError::SessionInvalidOrExpired => {
                (StatusCode::BAD_REQUEST, "Session is invalid or has expired")
            }
            BrokerError::TermsNotAccepted => {
                (StatusCode::BAD_REQUEST, "Terms and conditions must be accepted")
            }
            BrokerError::AuthFailed => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            BrokerError::AccountNotFound => (StatusCode::NOT_FOUND, "Account not found"),
            BrokerError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "Too many requests"),
            BrokerError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            BrokerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "success": false, "reason": message });
        (status, axum::Json(body)).into_response()
    }
}
