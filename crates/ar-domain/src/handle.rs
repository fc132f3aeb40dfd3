//! Human-readable handles (e.g. `alice.example`), normalized per §3.

use crate::error::{Error, Result};

const MAX_HANDLE_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// A normalized handle: trimmed, leading `@` dropped, lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    /// Normalize and validate a raw handle string per §3.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let without_at = trimmed.strip_prefix('@').unwrap_or(trimmed);
        let normalized = without_at.to_lowercase();

        validate_handle(&normalized)?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_handle(h: &str) -> Result<()> {
    if h.is_empty() {
        return Err(Error::InvalidInput("handle must not be empty".into()));
    }
    if h.len() > MAX_HANDLE_LEN {
        return Err(Error::InvalidInput(format!(
            "handle exceeds {MAX_HANDLE_LEN} characters"
        )));
    }
    if !h.contains('.') {
        return Err(Error::InvalidInput(format!(
            "\"{h}\" is not a valid handle: a bare word with no dot is not a handle"
        )));
    }

    let labels: Vec<&str> = h.split('.').collect();
    for label in &labels {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(Error::InvalidInput(format!(
                "handle label \"{label}\" must be 1..{MAX_LABEL_LEN} characters"
            )));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(Error::InvalidInput(format!(
                "handle label \"{label}\" contains characters other than ASCII letters, digits and hyphens"
            )));
        }
        let first = label.chars().next().unwrap();
        let last = label.chars().last().unwrap();
        if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
            return Err(Error::InvalidInput(format!(
                "handle label \"{label}\" must start and end with an alphanumeric character"
            )));
        }
    }

    let final_label = labels.last().unwrap();
    if !final_label.chars().next().unwrap().is_ascii_alphabetic() {
        return Err(Error::InvalidInput(format!(
            "final handle label \"{final_label}\" must start with a letter"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_whitespace_at_and_case() {
        let h = Handle::parse("  @Alice.Example  ").unwrap();
        assert_eq!(h.as_str(), "alice.example");
    }

    #[test]
    fn rejects_bare_word() {
        let err = Handle::parse("alice").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn rejects_empty() {
        assert!(Handle::parse("   ").is_err());
    }

    #[test]
    fn rejects_overlong_handle() {
        let long_label = "a".repeat(63);
        let handle = std::iter::repeat(long_label)
            .take(5)
            .collect::<Vec<_>>()
            .join(".");
        assert!(handle.len() > MAX_HANDLE_LEN);
        assert!(Handle::parse(&handle).is_err());
    }

    #[test]
    fn rejects_overlong_label() {
        let label = "a".repeat(64);
        assert!(Handle::parse(&format!("{label}.example")).is_err());
    }

    #[test]
    fn rejects_label_starting_with_hyphen() {
        assert!(Handle::parse("-alice.example").is_err());
    }

    #[test]
    fn rejects_label_ending_with_hyphen() {
        assert!(Handle::parse("alice-.example").is_err());
    }

    #[test]
    fn rejects_final_label_starting_with_digit() {
        assert!(Handle::parse("alice.3xample").is_err());
    }

    #[test]
    fn accepts_multi_label_handle() {
        let h = Handle::parse("bob.bsky.social").unwrap();
        assert_eq!(h.as_str(), "bob.bsky.social");
    }

    #[test]
    fn accepts_hyphenated_label() {
        let h = Handle::parse("my-name.example").unwrap();
        assert_eq!(h.as_str(), "my-name.example");
    }
}
