//! Extracted categories and the category -> value mapping handed to the matcher.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Semantic type of an extractable value.
///
/// Declaration order is the recognizer priority order and therefore the
/// order in which the matcher visits categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Email,
    Phone,
    Date,
    Name,
    Address,
    ZipCode,
    Ssn,
    CreditCard,
}

impl Category {
    /// All categories in priority order.
    pub const ALL: [Category; 8] = [
        Category::Email,
        Category::Phone,
        Category::Date,
        Category::Name,
        Category::Address,
        Category::ZipCode,
        Category::Ssn,
        Category::CreditCard,
    ];

    /// Wire name of the category (also the form data key).
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Email => "email",
            Category::Phone => "phone",
            Category::Date => "date",
            Category::Name => "name",
            Category::Address => "address",
            Category::ZipCode => "zipCode",
            Category::Ssn => "ssn",
            Category::CreditCard => "creditCard",
        }
    }

    /// Parse a wire name, case-insensitively.
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single representative value for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedValue {
    pub category: Category,
    pub value: String,
}

impl ExtractedValue {
    pub fn new(category: Category, value: impl Into<String>) -> Self {
        Self {
            category,
            value: value.into(),
        }
    }
}

/// Insertion-ordered mapping from field key to value.
///
/// Keys are category wire names when produced locally; data returned by an
/// external process may carry arbitrary keys. Empty values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormData {
    entries: IndexMap<String, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value for the key in place.
    ///
    /// Returns `false` (and stores nothing) when the value is blank.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let value = value.into();
        if value.trim().is_empty() {
            return false;
        }
        self.entries.insert(key.into(), value);
        true
    }

    /// Get the value stored under a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Get the value extracted for a category.
    pub fn category(&self, category: Category) -> Option<&str> {
        self.get(category.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<ExtractedValue> for FormData {
    fn from_iter<I: IntoIterator<Item = ExtractedValue>>(iter: I) -> Self {
        let mut data = FormData::new();
        for extracted in iter {
            data.insert(extracted.category.as_str(), extracted.value);
        }
        data
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = FormData::new();
        for (key, value) in iter {
            data.insert(key, value);
        }
        data
    }
}

impl<'de> Deserialize<'de> for FormData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // External producers report missing fields as null.
        let raw = IndexMap::<String, Option<String>>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_category_wire_names() {
        assert_eq!(Category::ZipCode.as_str(), "zipCode");
        assert_eq!(Category::from_str("creditcard"), Some(Category::CreditCard));
        assert_eq!(Category::from_str("policyNumber"), None);
        assert_eq!(
            serde_json::to_string(&Category::CreditCard).unwrap(),
            "\"creditCard\""
        );
    }

    #[test]
    fn test_priority_order_matches_declaration() {
        let mut shuffled = vec![Category::Ssn, Category::Email, Category::Name];
        shuffled.sort();
        assert_eq!(shuffled, vec![Category::Email, Category::Name, Category::Ssn]);
    }

    #[test]
    fn test_insert_rejects_blank_values() {
        let mut data = FormData::new();
        assert!(!data.insert("email", ""));
        assert!(!data.insert("phone", "   "));
        assert!(data.is_empty());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut data = FormData::new();
        data.insert("email", "a@b.com");
        data.insert("phone", "555-123-4567");
        data.insert("email", "c@d.com");

        let keys: Vec<&str> = data.keys().collect();
        assert_eq!(keys, vec!["email", "phone"]);
        assert_eq!(data.get("email"), Some("c@d.com"));
    }

    #[test]
    fn test_deserialize_drops_nulls_and_keeps_order() {
        let data: FormData = serde_json::from_str(
            r#"{"policyNumber": "PN-1", "claimantName": null, "contactEmail": "x@y.io"}"#,
        )
        .unwrap();

        let entries: Vec<(&str, &str)> = data.iter().collect();
        assert_eq!(
            entries,
            vec![("policyNumber", "PN-1"), ("contactEmail", "x@y.io")]
        );
    }
}
