//! ContentId: the opaque identifier a storage backend hands back for a payload.
//!
//! The gateway never interprets identifiers beyond using them as map keys and
//! taking a short prefix for filenames. The one exception is [`ContentId::digest`],
//! which mints BLAKE3-based identifiers for backends that have no naming scheme
//! of their own (the in-memory backend).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of characters used as the filename disambiguator.
pub const SHORT_LEN: usize = 8;

/// An opaque, immutable content identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

/// Errors that can occur when constructing a content identifier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("content identifier must not be empty")]
    Empty,
}

impl ContentId {
    /// Wrap a backend-issued identifier.
    ///
    /// Surrounding whitespace is trimmed; an identifier that is empty after
    /// trimming is rejected.
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        if trimmed.len() == id.len() {
            Ok(Self(id))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// Mint an identifier from the content itself.
    ///
    /// 128 bits of BLAKE3, hex encoded, prefixed with `b3` so it never looks
    /// like a CID from a real node.
    pub fn digest(data: &[u8]) -> Self {
        let hash = blake3::hash(data);
        Self(format!("b3{}", hex::encode(&hash.as_bytes()[..16])))
    }

    /// First [`SHORT_LEN`] characters, or the whole identifier if shorter.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(SHORT_LEN) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ContentId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.0
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_takes_eight_chars() {
        let id: ContentId = "QmABCDEFGHIJKLMNOP".parse().unwrap();
        assert_eq!(id.short(), "QmABCDEF");
    }

    #[test]
    fn test_short_of_short_id_is_whole_id() {
        let id: ContentId = "Qm12".parse().unwrap();
        assert_eq!(id.short(), "Qm12");
    }

    #[test]
    fn test_short_counts_chars_not_bytes() {
        let id: ContentId = "ééééééééé".parse().unwrap();
        assert_eq!(id.short().chars().count(), 8);
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(ContentId::new(""), Err(IdError::Empty));
        assert_eq!(ContentId::new("   "), Err(IdError::Empty));
    }

    #[test]
    fn test_whitespace_trimmed() {
        let id = ContentId::new("  bafy123 ").unwrap();
        assert_eq!(id.as_str(), "bafy123");
    }

    #[test]
    fn test_digest_is_deterministic() {
        let a = ContentId::digest(b"same bytes");
        let b = ContentId::digest(b"same bytes");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 34);
        assert!(a.as_str().starts_with("b3"));
        assert_ne!(a, ContentId::digest(b"other bytes"));
    }

    #[test]
    fn test_serde_is_transparent_string() {
        let id: ContentId = "bafkreiabc".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"bafkreiabc\"");
        let back: ContentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let bad: Result<ContentId, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }
}
