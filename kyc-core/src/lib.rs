//! KYC Core Library
//!
//! Turns a scanned identity-document QR payload into a structured,
//! normalized record and derives login credentials from it:
//! - Format detection with an ordered fallback chain (envelope, XML,
//!   delimited, legacy numeric, best-effort text mining)
//! - Attribute normalization (name, gender, year of birth, masked address)
//! - Salted one-way hashing of the document reference for lookup
//! - Deterministic password derivation from name + date of birth

pub mod credential;
pub mod error;
pub mod extract;
pub mod hasher;
pub mod normalize;
pub mod record;

pub use credential::{dob6, generate_password, login_key, name4, password_hint, validate_password};
pub use error::Error;
pub use extract::{extract_image, extract_payload, Extractor};
pub use hasher::ReferenceHasher;
pub use normalize::{
    derive_year_of_birth, mask_address, normalize_gender, normalize_name, normalize_record,
};
pub use record::{Gender, IdentityRecord, NormalizedAttributes, YearOfBirth};

/// Result type for kyc-core operations
pub type Result<T> = std::result::Result<T, Error>;
