//! Deterministic credential derivation
//!
//! The password is a pure function of two free-text fields from the
//! document: `NAME4 + DOB6`, 10 characters. The same scan always
//! yields the same password, which is what makes reset-by-reverification
//! possible; nothing derived needs to be stored.

use chrono::{Datelike, NaiveDate, Utc};

use crate::error::Error;
use crate::Result;

/// Date formats accepted for the date of birth, tried in order;
/// the first strict match wins.
const DOB_FORMATS: &[&str] = &[
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%m/%d/%Y",
];

/// Derive the 4-letter name component.
///
/// Collects letters from the name tokens left to right until 4 are
/// gathered, truncates to 4, pads with `X`, uppercases.
pub fn name4(full_name: &str) -> String {
    let mut collected = String::with_capacity(4);
    for token in full_name.split_whitespace() {
        for c in token.chars().filter(|c| c.is_ascii_alphabetic()) {
            collected.push(c.to_ascii_uppercase());
            if collected.len() == 4 {
                return collected;
            }
        }
    }
    while collected.len() < 4 {
        collected.push('X');
    }
    collected
}

/// Derive the 6-digit date component: `DD` + `MM` + last two year digits.
pub fn dob6(dob: &str) -> Result<String> {
    let trimmed = dob.trim();
    let date = DOB_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| Error::InvalidDate(trimmed.to_string()))?;

    let year = date.year();
    let current_year = Utc::now().year();
    if !(1900..=current_year).contains(&year) {
        return Err(Error::InvalidDate(format!(
            "birth year {year} out of range 1900..={current_year}"
        )));
    }

    Ok(format!(
        "{:02}{:02}{:02}",
        date.day(),
        date.month(),
        year % 100
    ))
}

/// `NAME4 + DOB6`: the full 10-character derived password.
pub fn generate_password(full_name: &str, dob: &str) -> Result<String> {
    if full_name.trim().is_empty() {
        return Err(Error::InvalidName);
    }
    Ok(format!("{}{}", name4(full_name), dob6(dob)?))
}

/// Short, non-secret login identifier derived from the name.
pub fn login_key(full_name: &str) -> String {
    name4(full_name)
}

/// Recompute the password from name + dob and compare.
pub fn validate_password(candidate: &str, full_name: &str, dob: &str) -> bool {
    match generate_password(full_name, dob) {
        Ok(expected) => candidate == expected,
        Err(_) => false,
    }
}

/// UI-safe hint: the name component visible, the date component masked.
pub fn password_hint(full_name: &str) -> String {
    format!("{}******", name4(full_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name4_pads_short_names() {
        assert_eq!(name4("A B"), "ABXX");
        assert_eq!(name4(""), "XXXX");
        assert_eq!(name4("Jo"), "JOXX");
    }

    #[test]
    fn test_name4_collects_across_tokens() {
        assert_eq!(name4("Fredrick Nadar"), "FRED");
        assert_eq!(name4("Rohit Kumar"), "ROHI");
        assert_eq!(name4("a. b. cdef"), "ABCD");
    }

    #[test]
    fn test_name4_ignores_non_letters() {
        assert_eq!(name4("R2-D2 C3PO"), "RDCP");
    }

    #[test]
    fn test_dob6_accepts_listed_formats() {
        assert_eq!(dob6("17/05/2006").unwrap(), "170506");
        assert_eq!(dob6("17-05-2006").unwrap(), "170506");
        assert_eq!(dob6("2006-05-17").unwrap(), "170506");
        assert_eq!(dob6("2006/05/17").unwrap(), "170506");
        assert_eq!(dob6("17.05.2006").unwrap(), "170506");
    }

    #[test]
    fn test_dob6_first_strict_match_wins() {
        // Day-first beats the US format when both could apply
        assert_eq!(dob6("05/06/2006").unwrap(), "050606");
    }

    #[test]
    fn test_dob6_rejects_out_of_range_years() {
        assert!(matches!(dob6("17/05/1899"), Err(Error::InvalidDate(_))));
        assert!(matches!(dob6("17/05/2999"), Err(Error::InvalidDate(_))));
    }

    #[test]
    fn test_dob6_rejects_garbage() {
        assert!(dob6("yesterday").is_err());
        assert!(dob6("").is_err());
        assert!(dob6("32/01/1990").is_err());
    }

    #[test]
    fn test_generate_password_deterministic() {
        let p1 = generate_password("Fredrick Nadar", "17/05/2006").unwrap();
        let p2 = generate_password("Fredrick Nadar", "17/05/2006").unwrap();
        assert_eq!(p1, "FRED170506");
        assert_eq!(p1, p2);
        assert_eq!(p1.len(), 10);
    }

    #[test]
    fn test_generate_password_requires_name() {
        assert!(matches!(
            generate_password("  ", "17/05/2006"),
            Err(Error::InvalidName)
        ));
    }

    #[test]
    fn test_validate_password_roundtrip() {
        assert!(validate_password(
            "ROHI150895",
            "Rohit Kumar",
            "15/08/1995"
        ));
        assert!(!validate_password(
            "ROHI150896",
            "Rohit Kumar",
            "15/08/1995"
        ));
        assert!(!validate_password("anything", "Rohit Kumar", "bad date"));
    }

    #[test]
    fn test_password_hint_masks_date() {
        assert_eq!(password_hint("Fredrick Nadar"), "FRED******");
    }
}
