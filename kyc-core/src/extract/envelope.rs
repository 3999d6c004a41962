//! Encoded-envelope strategies
//!
//! Newer document QRs wrap the demographic body in a JSON array:
//! `[version, timestamp, signature, ..., base64-body]`. The leading
//! markers are not cryptographically checked here; the body is
//! decoded best-effort. Some older payloads are a bare base64 blob
//! carrying XML. Speculative decryption of unreadable bodies is
//! deliberately not attempted: an undecodable envelope is rejected.

use std::io::Read;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::{DeflateDecoder, GzDecoder};

use super::{dispatch_shapes, printable_ascii_ratio, FormatStrategy};
use crate::record::IdentityRecord;

/// Minimum share of printable ASCII for a decoded body to be accepted.
const MIN_PRINTABLE_RATIO: f64 = 0.30;

/// JSON-array envelope: the last element is the encoded body.
pub struct EnvelopeStrategy;

impl FormatStrategy for EnvelopeStrategy {
    fn name(&self) -> &'static str {
        "envelope"
    }

    fn attempt(&self, payload: &str) -> Option<IdentityRecord> {
        if !(payload.starts_with('[') && payload.ends_with(']')) {
            return None;
        }
        let elements: Vec<serde_json::Value> = serde_json::from_str(payload).ok()?;
        if elements.len() < 4 {
            return None;
        }
        let body = elements.last()?.as_str()?;
        let raw = BASE64.decode(body.trim()).ok()?;

        let text = decode_body(&raw)?;
        dispatch_shapes(&text)
    }
}

/// Bare base64 payload that decodes to XML.
pub struct Base64XmlStrategy;

impl FormatStrategy for Base64XmlStrategy {
    fn name(&self) -> &'static str {
        "base64-xml"
    }

    fn attempt(&self, payload: &str) -> Option<IdentityRecord> {
        if !looks_like_base64(payload) {
            return None;
        }
        let raw = BASE64.decode(payload).ok()?;
        if printable_ascii_ratio(&raw) < MIN_PRINTABLE_RATIO {
            return None;
        }
        let text = String::from_utf8_lossy(&raw);
        if !has_xml_markers(&text) {
            return None;
        }
        dispatch_shapes(&text)
    }
}

/// Unwrap the body: gzip inflate, then raw deflate, then UTF-8 as-is,
/// accepting the first candidate with a plausible printable ratio.
fn decode_body(raw: &[u8]) -> Option<String> {
    let mut gunzipped = String::new();
    if GzDecoder::new(raw).read_to_string(&mut gunzipped).is_ok()
        && printable_ascii_ratio(gunzipped.as_bytes()) >= MIN_PRINTABLE_RATIO
    {
        return Some(gunzipped);
    }

    let mut inflated = String::new();
    if DeflateDecoder::new(raw)
        .read_to_string(&mut inflated)
        .is_ok()
        && printable_ascii_ratio(inflated.as_bytes()) >= MIN_PRINTABLE_RATIO
    {
        return Some(inflated);
    }

    if printable_ascii_ratio(raw) >= MIN_PRINTABLE_RATIO {
        return Some(String::from_utf8_lossy(raw).into_owned());
    }

    None
}

fn looks_like_base64(payload: &str) -> bool {
    payload.len() >= 8
        && payload.len() % 4 == 0
        && payload
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=')
}

fn has_xml_markers(text: &str) -> bool {
    text.contains('<') && (text.contains('>') || text.contains("=\""))
}
