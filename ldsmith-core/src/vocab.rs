use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A schema type name such as `Product`. Never empty, never padded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VocabularyName(String);

impl VocabularyName {
    pub fn parse(raw: &str) -> Result<Self> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidVocabulary(
                "vocabulary name must not be empty".to_string(),
            ));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VocabularyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VocabularyName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VocabularyName {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<VocabularyName> for String {
    fn from(value: VocabularyName) -> Self {
        value.0
    }
}

/// Case-insensitive substring filter over an index listing
pub fn filter_vocabularies<'a>(names: &'a [String], filter: &str) -> Vec<&'a str> {
    let needle = filter.trim().to_lowercase();
    names
        .iter()
        .filter(|name| needle.is_empty() || name.to_lowercase().contains(&needle))
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        assert_eq!(VocabularyName::parse("  Product ").unwrap().as_str(), "Product");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert!(VocabularyName::parse("").is_err());
        assert!(VocabularyName::parse("   ").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<VocabularyName>("\"Event\"").is_ok());
        assert!(serde_json::from_str::<VocabularyName>("\"\"").is_err());
    }

    #[test]
    fn test_filter_vocabularies() {
        let names = vec![
            "Product".to_string(),
            "ProductModel".to_string(),
            "Event".to_string(),
        ];
        assert_eq!(filter_vocabularies(&names, "product"), vec!["Product", "ProductModel"]);
        assert_eq!(filter_vocabularies(&names, "").len(), 3);
    }
}
