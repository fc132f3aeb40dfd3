//! Stable Identifier (SID) — `did:plc:` and `did:web:` account identifiers.

use std::fmt;

use crate::error::{Error, Result};

/// A validated, case-normalized stable identifier.
///
/// Two forms are accepted: `did:plc:<24 base32 chars>` and
/// `did:web:<domain>[:<port>][/<path>...]`. Validation is strict per
/// form (§3); normalization lowercases the whole string on ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Sid(String);

const PLC_PREFIX: &str = "did:plc:";
const WEB_PREFIX: &str = "did:web:";
const PLC_ID_LEN: usize = 24;

impl Sid {
    /// Parse and validate a raw SID string, lowercasing it first.
    pub fn parse(raw: &str) -> Result<Self> {
        let lower = raw.trim().to_lowercase();

        if let Some(rest) = lower.strip_prefix(PLC_PREFIX) {
            if rest.len() != PLC_ID_LEN || !rest.chars().all(is_base32_char) {
                return Err(Error::InvalidInput(format!(
                    "invalid did:plc identifier: \"{raw}\" (expected {PLC_ID_LEN} base32 chars)"
                )));
            }
            return Ok(Self(lower));
        }

        if let Some(rest) = lower.strip_prefix(WEB_PREFIX) {
            if rest.is_empty() || !is_valid_did_web_body(rest) {
                return Err(Error::InvalidInput(format!(
                    "invalid did:web identifier: \"{raw}\""
                )));
            }
            return Ok(Self(lower));
        }

        Err(Error::InvalidInput(format!(
            "not a recognized SID (must start with \"did:plc:\" or \"did:web:\"): \"{raw}\""
        )))
    }

    /// True if `s` already looks like an SID (used to short-circuit handle
    /// resolution in §4.2).
    pub fn looks_like_sid(s: &str) -> bool {
        let lower = s.trim().to_lowercase();
        lower.starts_with(PLC_PREFIX) || lower.starts_with(WEB_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_did_web(&self) -> bool {
        self.0.starts_with(WEB_PREFIX)
    }

    pub fn is_did_plc(&self) -> bool {
        self.0.starts_with(PLC_PREFIX)
    }

    /// Decode the `did:web` identifier into the host (and optional path
    /// segments) it encodes, per the web-DID spec: `:` separators become
    /// `/` path segments, and a port suffix `%3A<port>` unescapes to
    /// `:<port>`.
    pub fn did_web_host_path(&self) -> Option<(String, Vec<String>)> {
        let rest = self.0.strip_prefix(WEB_PREFIX)?;
        let mut parts = rest.split(':');
        let host_part = parts.next()?;
        let host = host_part.replace("%3a", ":");
        let path: Vec<String> = parts.map(|s| s.to_string()).collect();
        Some((host, path))
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for Sid {
    type Error = Error;
    fn try_from(value: &str) -> Result<Self> {
        Sid::parse(value)
    }
}

impl TryFrom<String> for Sid {
    type Error = Error;
    fn try_from(value: String) -> Result<Self> {
        Sid::parse(&value)
    }
}

fn is_base32_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '2'..='7')
}

fn is_valid_did_web_body(rest: &str) -> bool {
    rest.split(':').all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '%'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_did_plc() {
        let sid = Sid::parse("did:plc:5cajdgeo6qz32kptlpg4c3lv").unwrap();
        assert_eq!(sid.as_str(), "did:plc:5cajdgeo6qz32kptlpg4c3lv");
    }

    #[test]
    fn normalizes_case() {
        let sid = Sid::parse("did:plc:5CAJDGEO6QZ32KPTLPG4C3LV").unwrap();
        assert_eq!(sid.as_str(), "did:plc:5cajdgeo6qz32kptlpg4c3lv");
    }

    #[test]
    fn rejects_wrong_length_plc() {
        assert!(Sid::parse("did:plc:tooshort").is_err());
        assert!(Sid::parse("did:plc:5cajdgeo6qz32kptlpg4c3lvxx").is_err());
    }

    #[test]
    fn rejects_non_base32_chars() {
        // '1', '0', '8', '9' are not valid base32 (a-z minus some, 2-7)
        assert!(Sid::parse("did:plc:5cajdgeo6qz32kptlpg4c3l1").is_err());
    }

    #[test]
    fn accepts_did_web() {
        let sid = Sid::parse("did:web:example.com").unwrap();
        assert_eq!(sid.as_str(), "did:web:example.com");
    }

    #[test]
    fn rejects_empty_did_web() {
        assert!(Sid::parse("did:web:").is_err());
    }

    #[test]
    fn rejects_unrecognized_prefix() {
        assert!(Sid::parse("did:key:abcdef").is_err());
        assert!(Sid::parse("not-a-did").is_err());
    }

    #[test]
    fn looks_like_sid_is_prefix_only() {
        assert!(Sid::looks_like_sid("did:plc:whatever"));
        assert!(Sid::looks_like_sid("DID:WEB:example.com"));
        assert!(!Sid::looks_like_sid("alice.example"));
    }

    #[test]
    fn did_web_host_path_splits_on_colon() {
        let sid = Sid::parse("did:web:example.com:path:to:user").unwrap();
        let (host, path) = sid.did_web_host_path().unwrap();
        assert_eq!(host, "example.com");
        assert_eq!(path, vec!["path", "to", "user"]);
    }
}
