//! Catalog item types and identifier validation.

use std::fmt;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

static ASIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^[A-Za-z0-9]{10}$").unwrap());

/// External catalog identifier: 10 alphanumeric characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asin(String);

impl Asin {
    /// Parse and validate an identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        if ASIN_RE.is_match(&raw) {
            Ok(Self(raw))
        } else {
            Err(CoreError::Validation(format!(
                "invalid identifier {:?}: expected 10 alphanumeric characters",
                raw
            )))
        }
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable snapshot of an external catalog entry.
///
/// Not persisted directly; a `Request` is created from one on approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// External identifier.
    pub asin: Asin,
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Narrator, when the catalog reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrator: Option<String>,
    /// ISBN, when the catalog reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
}

/// Loosely-shaped catalog record as received from the wire.
///
/// Every field is optional; `CatalogItem::from_raw` decides what is
/// acceptable. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCatalogRecord {
    pub asin: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub narrator: Option<String>,
    pub isbn: Option<String>,
}

impl CatalogItem {
    /// Validate a raw record into a catalog item.
    ///
    /// Rejects records without a well-formed identifier or with an empty
    /// title or author, so downstream matching never sees vacuous text.
    pub fn from_raw(raw: RawCatalogRecord) -> Result<Self, CoreError> {
        let asin = Asin::new(raw.asin.unwrap_or_default())?;

        let title = raw.title.unwrap_or_default().trim().to_string();
        if title.is_empty() {
            return Err(CoreError::Validation(format!(
                "catalog record {} has no title",
                asin
            )));
        }

        let author = raw.author.unwrap_or_default().trim().to_string();
        if author.is_empty() {
            return Err(CoreError::Validation(format!(
                "catalog record {} has no author",
                asin
            )));
        }

        Ok(Self {
            asin,
            title,
            author,
            narrator: raw.narrator.filter(|n| !n.trim().is_empty()),
            isbn: raw.isbn.filter(|i| !i.trim().is_empty()),
        })
    }
}

/// A catalog item annotated with library/request availability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedItem {
    /// The catalog item itself.
    pub item: CatalogItem,
    /// A matching library entry already exists.
    pub is_available: bool,
    /// A live request already exists for this identifier.
    pub is_requested: bool,
    /// Set when the live request belongs to a different user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_by_username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asin_valid() {
        let asin = Asin::new("B002V0QK4C").unwrap();
        assert_eq!(asin.as_str(), "B002V0QK4C");
        assert_eq!(asin.to_string(), "B002V0QK4C");
    }

    #[test]
    fn test_asin_wrong_length() {
        assert!(Asin::new("B002V0QK4").is_err());
        assert!(Asin::new("B002V0QK4C1").is_err());
        assert!(Asin::new("").is_err());
    }

    #[test]
    fn test_asin_rejects_punctuation() {
        assert!(Asin::new("B002-0QK4C").is_err());
        assert!(Asin::new("B002 0QK4C").is_err());
    }

    #[test]
    fn test_from_raw_complete() {
        let raw = RawCatalogRecord {
            asin: Some("B002V0QK4C".to_string()),
            title: Some("The Name of the Wind".to_string()),
            author: Some("Patrick Rothfuss".to_string()),
            narrator: Some("Nick Podehl".to_string()),
            isbn: Some("978-0-7564-0474-1".to_string()),
        };
        let item = CatalogItem::from_raw(raw).unwrap();
        assert_eq!(item.asin.as_str(), "B002V0QK4C");
        assert_eq!(item.narrator.as_deref(), Some("Nick Podehl"));
    }

    #[test]
    fn test_from_raw_missing_asin() {
        let raw = RawCatalogRecord {
            title: Some("Untitled".to_string()),
            author: Some("Unknown".to_string()),
            ..Default::default()
        };
        let err = CatalogItem::from_raw(raw).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_from_raw_blank_title_rejected() {
        let raw = RawCatalogRecord {
            asin: Some("B002V0QK4C".to_string()),
            title: Some("   ".to_string()),
            author: Some("Someone".to_string()),
            ..Default::default()
        };
        assert!(CatalogItem::from_raw(raw).is_err());
    }

    #[test]
    fn test_from_raw_blank_optionals_dropped() {
        let raw = RawCatalogRecord {
            asin: Some("B002V0QK4C".to_string()),
            title: Some("Title".to_string()),
            author: Some("Author".to_string()),
            narrator: Some("".to_string()),
            isbn: Some("  ".to_string()),
        };
        let item = CatalogItem::from_raw(raw).unwrap();
        assert!(item.narrator.is_none());
        assert!(item.isbn.is_none());
    }

    #[test]
    fn test_asin_serde_transparent() {
        let asin = Asin::new("1774243288").unwrap();
        let json = serde_json::to_string(&asin).unwrap();
        assert_eq!(json, "\"1774243288\"");
        let back: Asin = serde_json::from_str(&json).unwrap();
        assert_eq!(back, asin);
    }
}
