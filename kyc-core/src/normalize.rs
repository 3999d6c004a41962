//! Attribute normalization
//!
//! Total, non-throwing canonicalization of the untrusted fields an
//! extractor produces. Every function here accepts arbitrary garbage
//! and returns something usable.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;

use crate::record::{Gender, IdentityRecord, NormalizedAttributes, YearOfBirth};

static EMBEDDED_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap());
static PINCODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{6}$").unwrap());

/// Trim, collapse whitespace, strip punctuation, title-case.
pub fn normalize_name(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect();

    cleaned
        .split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Map any case-insensitive variant or prefix of male/female/transgender
/// to a canonical code. Unrecognized input defaults to M.
pub fn normalize_gender(raw: &str) -> Gender {
    let g = raw.trim().to_uppercase();
    if g.starts_with('F') {
        return Gender::F;
    }
    if g.starts_with('M') {
        return Gender::M;
    }
    if g.starts_with('T') || g == "THIRD GENDER" {
        return Gender::T;
    }
    Gender::M
}

/// Derive a year of birth from a raw DOB or YOB string.
///
/// Accepts a bare 4-digit year, any string with an embedded 19xx/20xx
/// year, or a parseable date. Falls back to `current_year - 25`,
/// flagged synthetic so callers can warn rather than trust the guess.
pub fn derive_year_of_birth(raw: Option<&str>) -> YearOfBirth {
    let current_year = Utc::now().year();
    let fallback = YearOfBirth {
        year: current_year - 25,
        synthetic: true,
    };

    let Some(raw) = raw else { return fallback };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return fallback;
    }

    if let Some(m) = EMBEDDED_YEAR.find(trimmed) {
        let year: i32 = m.as_str().parse().unwrap_or(0);
        if (1900..=current_year).contains(&year) {
            return YearOfBirth {
                year,
                synthetic: false,
            };
        }
    }

    for format in ["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            let year = date.year();
            if (1900..=current_year).contains(&year) {
                return YearOfBirth {
                    year,
                    synthetic: false,
                };
            }
        }
    }

    fallback
}

/// Canonicalize a full record in one pass.
pub fn normalize_record(record: &IdentityRecord) -> NormalizedAttributes {
    NormalizedAttributes {
        name: normalize_name(&record.name),
        gender: normalize_gender(&record.gender),
        year_of_birth: derive_year_of_birth(record.date_of_birth.as_deref()),
        masked_address: mask_address(&record.address),
    }
}

/// Reduce an address to a privacy-safe preview.
///
/// Short addresses pass through unchanged. Long ones keep only the
/// 6-digit pincode and the last two tokens of at least 4 characters,
/// prefixed with a redaction marker.
pub fn mask_address(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| {
            c.is_alphanumeric() || c.is_whitespace() || matches!(c, ',' | '.' | '-' | '_')
        })
        .collect();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.len() <= 20 {
        return cleaned;
    }

    let parts: Vec<&str> = cleaned
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();

    let pincode = parts.iter().copied().find(|p| PINCODE.is_match(p));
    let candidates: Vec<&str> = parts
        .iter()
        .copied()
        .filter(|p| p.len() >= 4 && Some(*p) != pincode)
        .collect();
    let locality = &candidates[candidates.len().saturating_sub(2)..];

    let mut kept: Vec<&str> = Vec::new();
    if let Some(pc) = pincode {
        kept.push(pc);
    }
    kept.extend_from_slice(locality);
    // Keep at most three surviving tokens
    let start = kept.len().saturating_sub(3);
    let preview = kept[start..].join(", ");

    if preview.is_empty() {
        "***".to_string()
    } else {
        format!("***, {preview}")
    }
}
