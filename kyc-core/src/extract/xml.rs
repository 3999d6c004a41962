//! XML-shaped payloads
//!
//! Handles both attribute form (`name="Rohit Kumar"`) and element form
//! (`<name>Rohit Kumar</name>`). When no single address field exists,
//! the address is reassembled from the co/house/street/loc/vtc/po/
//! dist/state/pc sub-fields in document order.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::FormatStrategy;
use crate::record::IdentityRecord;

static ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z]+)\s*=\s*"([^"]*)""#).unwrap());
static ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*([A-Za-z]+)[^>/]*>([^<]+)<").unwrap());
static TEXT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">([A-Za-z ]{6,50})<").unwrap());

/// Address sub-fields, in the order they are reassembled.
const ADDRESS_PARTS: &[&str] = &[
    "co", "house", "street", "loc", "vtc", "po", "dist", "state", "pc",
];

pub struct XmlStrategy;

impl FormatStrategy for XmlStrategy {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn attempt(&self, payload: &str) -> Option<IdentityRecord> {
        let has_tags = payload.contains('<') && payload.contains('>');
        let has_pairs = ATTR.is_match(payload);
        if !has_tags && !has_pairs {
            return None;
        }

        let fields = collect_fields(payload);
        let get = |key: &str| fields.get(key).map(|s| s.trim()).filter(|s| !s.is_empty());

        let name = match get("name").or_else(|| get("n")) {
            Some(n) => n.to_string(),
            // Last resort: a free-text run that looks like "First Last"
            None => TEXT_NAME
                .captures(payload)
                .map(|c| c[1].trim().to_string())
                .filter(|n| n.split_whitespace().count() >= 2)?,
        };

        let dob = get("dob").map(str::to_string).or_else(|| {
            // Year-only documents: pin to January 1st
            get("yob").map(|yob| format!("01/01/{yob}"))
        });

        let address = match get("address") {
            Some(a) => a.to_string(),
            None => ADDRESS_PARTS
                .iter()
                .filter_map(|part| get(part))
                .collect::<Vec<_>>()
                .join(", "),
        };

        Some(IdentityRecord {
            name,
            date_of_birth: dob,
            gender: get("gender").unwrap_or("M").to_string(),
            address,
            reference: get("uid").map(str::to_string),
        })
    }
}

/// Single pass over attribute and element fields; first occurrence wins.
fn collect_fields(payload: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for caps in ATTR.captures_iter(payload) {
        fields
            .entry(caps[1].to_lowercase())
            .or_insert_with(|| caps[2].to_string());
    }
    for caps in ELEMENT.captures_iter(payload) {
        fields
            .entry(caps[1].to_lowercase())
            .or_insert_with(|| caps[2].to_string());
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_form() {
        let xml = r#"<?xml version="1.0"?><PrintLetterBarcodeData uid="999988887777" name="Sunita Gupta" gender="F" yob="1988" house="45" street="MG Road" vtc="Bangalore" state="Karnataka" pc="560001"/>"#;
        let record = XmlStrategy.attempt(xml).unwrap();
        assert_eq!(record.name, "Sunita Gupta");
        assert_eq!(record.gender, "F");
        assert_eq!(record.date_of_birth.as_deref(), Some("01/01/1988"));
        assert_eq!(record.reference.as_deref(), Some("999988887777"));
        assert_eq!(
            record.address,
            "45, MG Road, Bangalore, Karnataka, 560001"
        );
    }

    #[test]
    fn test_element_form() {
        let xml = "<data><uid>123456789012</uid><name>Amit Singh</name><gender>M</gender><dob>01/01/1985</dob><address>88 Park Street, Kolkata, 700016</address></data>";
        let record = XmlStrategy.attempt(xml).unwrap();
        assert_eq!(record.name, "Amit Singh");
        assert_eq!(record.date_of_birth.as_deref(), Some("01/01/1985"));
        assert_eq!(record.address, "88 Park Street, Kolkata, 700016");
    }

    #[test]
    fn test_bare_key_value_pairs() {
        let payload = r#"uid="123456789012" name="Priya Sharma" gender="F" dob="02/03/1992""#;
        let record = XmlStrategy.attempt(payload).unwrap();
        assert_eq!(record.name, "Priya Sharma");
    }

    #[test]
    fn test_single_address_field_wins_over_parts() {
        let xml = r#"<d name="A B" address="Full Address" vtc="Town" pc="600001"/>"#;
        let record = XmlStrategy.attempt(xml).unwrap();
        assert_eq!(record.address, "Full Address");
    }

    #[test]
    fn test_missing_name_declines() {
        let xml = r#"<d uid="123456789012" gender="M"/>"#;
        assert!(XmlStrategy.attempt(xml).is_none());
    }

    #[test]
    fn test_missing_uid_yields_no_reference() {
        let xml = r#"<d name="A B" dob="01/01/1990"/>"#;
        let record = XmlStrategy.attempt(xml).unwrap();
        assert!(record.reference.is_none());
    }

    #[test]
    fn test_non_xml_declines() {
        assert!(XmlStrategy.attempt("1234,Rohit,15/08/1995,M").is_none());
    }
}
