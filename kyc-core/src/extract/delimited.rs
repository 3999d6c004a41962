//! Comma- or pipe-delimited payloads
//!
//! Field order is not trusted: each field is classified on its own
//! (reference number, date, gender, name) and everything left over is
//! folded into the address.

use std::sync::LazyLock;

use regex::Regex;

use super::FormatStrategy;
use crate::record::IdentityRecord;

static REFERENCE_12: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{12}$").unwrap());
static REFERENCE_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{10,16}$").unwrap());
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}[/.-]\d{1,2}[/.-]\d{4}|\d{4}[/-]\d{1,2}[/-]\d{1,2})$").unwrap()
});
static GENDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)(m|f|t|male|female|transgender|third gender)$").unwrap());
static NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z .']+$").unwrap());
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}$").unwrap());

fn is_birth_year(field: &str) -> bool {
    YEAR.is_match(field)
        && field
            .parse::<i32>()
            .map(|year| (1900..=2010).contains(&year))
            .unwrap_or(false)
}

fn is_reference(field: &str) -> bool {
    REFERENCE_12.is_match(field)
        || (REFERENCE_ALNUM.is_match(field)
            && field.chars().filter(|c| c.is_ascii_digit()).count() >= 8)
}

pub struct DelimitedStrategy;

impl FormatStrategy for DelimitedStrategy {
    fn name(&self) -> &'static str {
        "delimited"
    }

    fn attempt(&self, payload: &str) -> Option<IdentityRecord> {
        let delimiter = if payload.contains(',') {
            ','
        } else if payload.contains('|') {
            '|'
        } else {
            return None;
        };

        let fields: Vec<&str> = payload
            .split(delimiter)
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();
        if fields.len() < 4 {
            return None;
        }

        let has_date = fields.iter().any(|f| DATE.is_match(f));

        let mut reference = None;
        let mut dob = None;
        let mut gender = None;
        let mut name = None;
        let mut address = Vec::new();

        for field in fields {
            if reference.is_none() && is_reference(field) {
                reference = Some(field.to_string());
            } else if dob.is_none() && DATE.is_match(field) {
                dob = Some(field.to_string());
            } else if dob.is_none() && !has_date && is_birth_year(field) {
                dob = Some(format!("01/01/{field}"));
            } else if gender.is_none() && GENDER.is_match(field) {
                gender = Some(field[..1].to_uppercase());
            } else if name.is_none() && NAME.is_match(field) && field.len() >= 2 {
                name = Some(field.to_string());
            } else {
                address.push(field);
            }
        }

        Some(IdentityRecord {
            name: name?,
            date_of_birth: dob,
            gender: gender.unwrap_or_else(|| "M".to_string()),
            address: address.join(", "),
            reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_separated_in_order() {
        let record = DelimitedStrategy
            .attempt("123456789012,Rohit Kumar,15/08/1995,M,12 MG Road,Chennai,600001")
            .unwrap();
        assert_eq!(record.name, "Rohit Kumar");
        assert_eq!(record.date_of_birth.as_deref(), Some("15/08/1995"));
        assert_eq!(record.gender, "M");
        assert_eq!(record.reference.as_deref(), Some("123456789012"));
        assert_eq!(record.address, "12 MG Road, Chennai, 600001");
    }

    #[test]
    fn test_pipe_separated_shuffled() {
        let record = DelimitedStrategy
            .attempt("Female|1992-03-02|Priya Sharma|999988887777|Pune")
            .unwrap();
        assert_eq!(record.name, "Priya Sharma");
        assert_eq!(record.gender, "F");
        assert_eq!(record.date_of_birth.as_deref(), Some("1992-03-02"));
        assert_eq!(record.reference.as_deref(), Some("999988887777"));
        assert_eq!(record.address, "Pune");
    }

    #[test]
    fn test_alphanumeric_reference() {
        let record = DelimitedStrategy
            .attempt("1234567890AB,Rohit Kumar,15/08/1995,M")
            .unwrap();
        assert_eq!(record.reference.as_deref(), Some("1234567890AB"));
        assert_eq!(record.name, "Rohit Kumar");
    }

    #[test]
    fn test_bare_year_promoted_to_january_first() {
        let record = DelimitedStrategy
            .attempt("123456789012,Rohit Kumar,1995,M")
            .unwrap();
        assert_eq!(record.date_of_birth.as_deref(), Some("01/01/1995"));
        assert_eq!(record.name, "Rohit Kumar");
    }

    #[test]
    fn test_full_date_wins_over_year_token() {
        let record = DelimitedStrategy
            .attempt("123456789012,Rohit Kumar,15/08/1995,M,1999")
            .unwrap();
        assert_eq!(record.date_of_birth.as_deref(), Some("15/08/1995"));
        assert_eq!(record.address, "1999");
    }

    #[test]
    fn test_out_of_range_year_is_address() {
        let record = DelimitedStrategy
            .attempt("123456789012,Rohit Kumar,M,2024")
            .unwrap();
        assert!(record.date_of_birth.is_none());
        assert_eq!(record.address, "2024");
    }

    #[test]
    fn test_fewer_than_four_fields_declines() {
        assert!(DelimitedStrategy.attempt("Hello, World").is_none());
        assert!(DelimitedStrategy.attempt("Amit Singh,Kolkata").is_none());
        assert!(DelimitedStrategy
            .attempt("123456789012,Rohit Kumar,15/08/1995")
            .is_none());
    }

    #[test]
    fn test_no_name_declines() {
        assert!(DelimitedStrategy
            .attempt("123456789012,15/08/1995,M,600001")
            .is_none());
    }

    #[test]
    fn test_no_delimiter_declines() {
        assert!(DelimitedStrategy.attempt("just a plain sentence").is_none());
    }
}
