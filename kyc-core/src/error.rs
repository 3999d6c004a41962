//! Error types for kyc-core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("No known document format matched the payload")]
    NoFormatMatched,

    #[error("Invalid date of birth: {0}")]
    InvalidDate(String),

    #[error("Invalid name")]
    InvalidName,

    #[error("Document reference missing from extracted record")]
    MissingReference,
}
