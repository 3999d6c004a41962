//! Data types shared across the extraction pipeline

use serde::{Deserialize, Serialize};

/// Canonical gender code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
    T,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
            Gender::T => "T",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Gender::M),
            "F" => Some(Gender::F),
            "T" => Some(Gender::T),
            _ => None,
        }
    }
}

/// Raw identity record as extracted from a document payload.
///
/// This is a best-structured guess, not a verified fact: every field
/// came from an untrusted payload and must be normalized before use.
/// Never persisted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub name: String,
    /// Date of birth in whatever format the document carried
    pub date_of_birth: Option<String>,
    /// Raw gender string (any case/variant)
    pub gender: String,
    pub address: String,
    /// Unique document reference; absent when the mining fallback
    /// recovered a name but no reference token
    pub reference: Option<String>,
}

/// Year of birth with provenance.
///
/// `synthetic` marks the estimate fallback so downstream consumers can
/// warn instead of trusting a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearOfBirth {
    pub year: i32,
    pub synthetic: bool,
}

/// Canonicalized attributes derived from an [`IdentityRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAttributes {
    pub name: String,
    pub gender: Gender,
    pub year_of_birth: YearOfBirth,
    pub masked_address: String,
}
