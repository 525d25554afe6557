//! Canonical ZIP Code Tabulation Area identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of digits in a canonical ZIP identifier
pub const ZIP_LEN: usize = 5;

/// A canonical, zero-padded five digit ZIP identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZipCode(String);

impl ZipCode {
    /// Canonicalize a raw identifier.
    ///
    /// Trims whitespace, drops a ZIP+4 suffix and left-pads short numeric
    /// identifiers (`"2138"` becomes `"02138"`). Anything that is not one to
    /// five ASCII digits after that is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let base = match trimmed.split_once('-') {
            Some((head, tail)) if tail.len() == 4 && tail.bytes().all(|b| b.is_ascii_digit()) => {
                head
            }
            Some(_) => return None,
            None => trimmed,
        };

        if base.is_empty() || base.len() > ZIP_LEN || !base.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Some(Self(format!("{:0>width$}", base, width = ZIP_LEN)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ZipCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical() {
        assert_eq!(ZipCode::parse("30327").unwrap().as_str(), "30327");
        assert_eq!(ZipCode::parse("  30327 ").unwrap().as_str(), "30327");
    }

    #[test]
    fn test_parse_pads_leading_zeros() {
        assert_eq!(ZipCode::parse("2138").unwrap().as_str(), "02138");
        assert_eq!(ZipCode::parse("501").unwrap().as_str(), "00501");
    }

    #[test]
    fn test_parse_strips_plus_four() {
        assert_eq!(ZipCode::parse("30327-1234").unwrap().as_str(), "30327");
        assert!(ZipCode::parse("30327-12").is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ZipCode::parse("").is_none());
        assert!(ZipCode::parse("ABCDE").is_none());
        assert!(ZipCode::parse("123456").is_none());
        assert!(ZipCode::parse("30 27").is_none());
    }
}
