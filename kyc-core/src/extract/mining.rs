//! Last-resort text mining
//!
//! Runs when no structured shape matched. Hunts for name-looking word
//! pairs in decreasing order of confidence, then picks up a date, a
//! gender marker and a 12-digit reference if the text happens to carry
//! them. Declines when no name can be found rather than inventing one.

use std::sync::LazyLock;

use regex::Regex;

use super::FormatStrategy;
use crate::record::IdentityRecord;

static TITLE_CASE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][a-z]{2,}\s+[A-Z][a-z]{2,}").unwrap());
static ALL_CAPS_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{3,}\s+[A-Z]{3,}").unwrap());
static MIXED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]{2,}\s+[A-Za-z]{2,}(\s+[A-Za-z]{2,})?").unwrap());
static STOP_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(and|the|for|with|address|male|female)$").unwrap());
static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}[/-]\d{2}[/-]\d{4}").unwrap());
static GENDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[MFT]\b").unwrap());
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{12}").unwrap());

fn find_name(text: &str) -> Option<String> {
    if let Some(m) = TITLE_CASE_NAME.find(text) {
        return Some(m.as_str().to_string());
    }
    if let Some(m) = ALL_CAPS_NAME.find(text) {
        return Some(title_case(m.as_str()));
    }
    MIXED_NAME
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|candidate| {
            candidate.len() > 5
                && !candidate.contains(|c: char| c.is_ascii_digit())
                && !STOP_WORDS.is_match(candidate)
        })
        .map(str::to_string)
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct TextMiningStrategy;

impl FormatStrategy for TextMiningStrategy {
    fn name(&self) -> &'static str {
        "text-mining"
    }

    fn attempt(&self, payload: &str) -> Option<IdentityRecord> {
        let name = find_name(payload)?;
        Some(IdentityRecord {
            name,
            date_of_birth: DATE.find(payload).map(|m| m.as_str().to_string()),
            gender: GENDER
                .find(payload)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "M".to_string()),
            address: String::new(),
            reference: REFERENCE.find(payload).map(|m| m.as_str().to_string()),
        })
    }
}
