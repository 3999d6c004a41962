//! Legacy space-separated numeric format
//!
//! `"2132 7234 5555 123456789012 Rohit Kumar 15/08/1995 M 12 MG Road"`
//! The first three tokens carry version info, the fourth is the
//! reference number, then name tokens run until a date or gender
//! marker, and whatever remains is the address.

use std::sync::LazyLock;

use regex::Regex;

use super::FormatStrategy;
use crate::record::IdentityRecord;

static PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4} \d{4} \d{4} ").unwrap());
static DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap());
static GENDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[MFT]$").unwrap());

pub struct LegacyNumericStrategy;

impl FormatStrategy for LegacyNumericStrategy {
    fn name(&self) -> &'static str {
        "legacy-numeric"
    }

    fn attempt(&self, payload: &str) -> Option<IdentityRecord> {
        if !PREFIX.is_match(payload) {
            return None;
        }

        let tokens: Vec<&str> = payload.split_whitespace().collect();
        if tokens.len() < 6 {
            return None;
        }

        let reference = tokens[3];
        let mut index = 4;

        let mut name_tokens = Vec::new();
        while index < tokens.len()
            && !DATE.is_match(tokens[index])
            && !GENDER.is_match(tokens[index])
        {
            name_tokens.push(tokens[index]);
            index += 1;
        }
        if name_tokens.is_empty() {
            return None;
        }

        let mut dob = None;
        if index < tokens.len() && DATE.is_match(tokens[index]) {
            dob = Some(tokens[index].to_string());
            index += 1;
        }

        let mut gender = "M";
        if index < tokens.len() && GENDER.is_match(tokens[index]) {
            gender = tokens[index];
            index += 1;
        }

        Some(IdentityRecord {
            name: name_tokens.join(" "),
            date_of_birth: dob,
            gender: gender.to_string(),
            address: tokens[index..].join(" "),
            reference: Some(reference.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_legacy_record() {
        let record = LegacyNumericStrategy
            .attempt("2132 7234 5555 123456789012 Rohit Kumar 15/08/1995 M 12 MG Road Chennai")
            .unwrap();
        assert_eq!(record.name, "Rohit Kumar");
        assert_eq!(record.date_of_birth.as_deref(), Some("15/08/1995"));
        assert_eq!(record.gender, "M");
        assert_eq!(record.reference.as_deref(), Some("123456789012"));
        assert_eq!(record.address, "12 MG Road Chennai");
    }

    #[test]
    fn test_name_only() {
        let record = LegacyNumericStrategy
            .attempt("2132 7234 5555 123456789012 Sunita Gupta")
            .unwrap();
        assert_eq!(record.name, "Sunita Gupta");
        assert!(record.date_of_birth.is_none());
        assert_eq!(record.gender, "M");
        assert_eq!(record.address, "");
    }

    #[test]
    fn test_missing_name_declines() {
        assert!(LegacyNumericStrategy
            .attempt("2132 7234 5555 123456789012 15/08/1995 F")
            .is_none());
    }

    #[test]
    fn test_non_numeric_prefix_declines() {
        assert!(LegacyNumericStrategy
            .attempt("Rohit Kumar 15/08/1995 M 123456789012")
            .is_none());
    }

    #[test]
    fn test_too_few_tokens_declines() {
        assert!(LegacyNumericStrategy.attempt("2132 7234 5555 1234").is_none());
    }
}
