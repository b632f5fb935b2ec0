//! Case-insensitive identifiers.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A platform identifier (username, group alias, tag name, problem alias).
///
/// The platform treats identifiers case-insensitively, so equality, hashing
/// and ordering all use the lowercase form. The original spelling is kept
/// and is what gets sent on add/update calls.
#[derive(Clone)]
pub struct Ident {
    original: String,
    folded: String,
}

impl Ident {
    pub fn new(value: impl Into<String>) -> Self {
        let original = value.into();
        let folded = original.to_lowercase();
        Self { original, folded }
    }

    /// The identifier as it was written.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// The lowercase form used for comparisons.
    pub fn folded(&self) -> &str {
        &self.folded
    }

    pub fn is_empty(&self) -> bool {
        self.original.trim().is_empty()
    }

    pub fn starts_with_ignore_case(&self, prefix: &str) -> bool {
        self.folded.starts_with(&prefix.to_lowercase())
    }
}

impl PartialEq for Ident {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for Ident {}

impl Hash for Ident {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

impl PartialOrd for Ident {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ident {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded.cmp(&other.folded)
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.original)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl From<&str> for Ident {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Ident {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Serialize for Ident {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.original)
    }
}

impl<'de> Deserialize<'de> for Ident {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_case() {
        assert_eq!(Ident::new("Alice"), Ident::new("alice"));
        assert_ne!(Ident::new("alice"), Ident::new("alicia"));
    }

    #[test]
    fn test_hash_set_dedups_by_folded_form() {
        let set: HashSet<Ident> = ["Bob", "BOB", "bob"].into_iter().map(Ident::new).collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_original_casing_is_preserved() {
        let ident = Ident::new("CamelCase");
        assert_eq!(ident.as_str(), "CamelCase");
        assert_eq!(ident.folded(), "camelcase");
        assert_eq!(ident.to_string(), "CamelCase");
    }

    #[test]
    fn test_prefix_match_ignores_case() {
        let tag = Ident::new("problemRestrictedTagKarel");
        assert!(tag.starts_with_ignore_case("PROBLEMRESTRICTEDTAG"));
        assert!(!Ident::new("problemTagArrays").starts_with_ignore_case("problemRestrictedTag"));
    }

    #[test]
    fn test_serde_keeps_original_spelling() {
        let ident: Ident = serde_json::from_str("\"MixedCase\"").unwrap();
        assert_eq!(serde_json::to_string(&ident).unwrap(), "\"MixedCase\"");
    }
}
