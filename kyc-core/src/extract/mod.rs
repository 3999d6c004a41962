//! Format detection and extraction
//!
//! A raw payload arrives as either a decoded QR string or an image.
//! Each supported document format is a stateless [`FormatStrategy`];
//! the [`Extractor`] walks them in priority order and returns the
//! first confident match. A strategy that does not recognize the
//! payload declines with `None` and the chain continues; only
//! exhaustion of the whole chain surfaces as an error.
//!
//! The output is a best-structured guess from untrusted input, never
//! a verified fact.

mod delimited;
mod envelope;
mod image;
mod legacy;
mod mining;
mod xml;

pub use image::extract_image;

use crate::error::Error;
use crate::record::IdentityRecord;
use crate::Result;

/// One attempt at recognizing a payload format.
pub trait FormatStrategy: Send + Sync {
    /// Short identifier for logging and error context.
    fn name(&self) -> &'static str;

    /// Return a record iff this strategy confidently matches.
    fn attempt(&self, payload: &str) -> Option<IdentityRecord>;
}

/// Ordered chain of format strategies.
pub struct Extractor {
    strategies: Vec<Box<dyn FormatStrategy>>,
}

impl Extractor {
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(envelope::EnvelopeStrategy),
                Box::new(envelope::Base64XmlStrategy),
                Box::new(xml::XmlStrategy),
                Box::new(delimited::DelimitedStrategy),
                Box::new(legacy::LegacyNumericStrategy),
                Box::new(mining::TextMiningStrategy),
            ],
        }
    }

    /// Walk the chain; first confident match wins.
    pub fn extract(&self, payload: &str) -> Result<IdentityRecord> {
        let trimmed = payload.trim();
        if trimmed.is_empty() {
            return Err(Error::NoFormatMatched);
        }
        for strategy in &self.strategies {
            if let Some(record) = strategy.attempt(trimmed) {
                return Ok(record);
            }
        }
        Err(Error::NoFormatMatched)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract from a string payload using the default strategy chain.
pub fn extract_payload(payload: &str) -> Result<IdentityRecord> {
    Extractor::new().extract(payload)
}

/// Dispatch already-decoded text through the shape strategies.
///
/// Used by the envelope strategy after it unwraps an encoded body: the
/// inner text gets the same XML / delimited / legacy / mining treatment
/// a bare payload would.
pub(crate) fn dispatch_shapes(text: &str) -> Option<IdentityRecord> {
    let shapes: [&dyn FormatStrategy; 4] = [
        &xml::XmlStrategy,
        &delimited::DelimitedStrategy,
        &legacy::LegacyNumericStrategy,
        &mining::TextMiningStrategy,
    ];
    let trimmed = text.trim();
    shapes.iter().find_map(|s| s.attempt(trimmed))
}

/// Share of printable-ASCII bytes in a buffer.
pub(crate) fn printable_ascii_ratio(bytes: &[u8]) -> f64 {
    if bytes.is_empty() {
        return 0.0;
    }
    let printable = bytes.iter().filter(|b| (0x20..=0x7e).contains(*b)).count();
    printable as f64 / bytes.len() as f64
}
