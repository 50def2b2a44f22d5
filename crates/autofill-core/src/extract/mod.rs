//! Pattern-based entity extraction.

mod extractor;
pub mod patterns;

pub use extractor::{EntityExtractor, ExtractionResult};

use serde::{Deserialize, Serialize};

use crate::models::form_data::Category;

/// Trait for single-category recognizers.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first occurrence in document order.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences in document order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A recognized substring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionMatch {
    /// Category of the recognizer that matched.
    pub category: Category,
    /// Matched text.
    pub value: String,
    /// Byte offset of the match start.
    pub start: usize,
    /// Byte offset one past the match end.
    pub end: usize,
}

/// Regex recognizer for one category.
#[derive(Debug, Clone, Copy)]
pub struct Recognizer {
    category: Category,
}

impl Recognizer {
    pub fn new(category: Category) -> Self {
        Self { category }
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

impl FieldExtractor for Recognizer {
    type Output = ExtractionMatch;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        // Leftmost match is the earliest starting offset.
        patterns::pattern_for(self.category)
            .find(text)
            .map(|m| ExtractionMatch {
                category: self.category,
                value: m.as_str().to_string(),
                start: m.start(),
                end: m.end(),
            })
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        patterns::pattern_for(self.category)
            .find_iter(text)
            .map(|m| ExtractionMatch {
                category: self.category,
                value: m.as_str().to_string(),
                start: m.start(),
                end: m.end(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(category: Category, text: &str) -> Option<String> {
        Recognizer::new(category).extract(text).map(|m| m.value)
    }

    #[test]
    fn test_email() {
        assert_eq!(
            first(Category::Email, "write to jane.doe+work@mail.example.org today"),
            Some("jane.doe+work@mail.example.org".to_string())
        );
        assert_eq!(first(Category::Email, "not-an-email@localhost"), None);
        assert_eq!(first(Category::Email, "short tld a@b.c"), None);
    }

    #[test]
    fn test_phone_formats() {
        assert_eq!(
            first(Category::Phone, "call 555-123-4567"),
            Some("555-123-4567".to_string())
        );
        assert_eq!(
            first(Category::Phone, "call (555) 123-4567"),
            Some("(555) 123-4567".to_string())
        );
        assert_eq!(
            first(Category::Phone, "intl +1 555.123.4567"),
            Some("+1 555.123.4567".to_string())
        );
        assert_eq!(
            first(Category::Phone, "dense 5551234567"),
            Some("5551234567".to_string())
        );
    }

    #[test]
    fn test_date_formats() {
        assert_eq!(first(Category::Date, "on 3/14/2024"), Some("3/14/2024".to_string()));
        assert_eq!(first(Category::Date, "on 14-03-24"), Some("14-03-24".to_string()));
        assert_eq!(first(Category::Date, "on 2024-03-14"), Some("2024-03-14".to_string()));
        assert_eq!(first(Category::Date, "on 2024.03.14"), None);
    }

    #[test]
    fn test_name_requires_two_capitalized_words() {
        assert_eq!(
            first(Category::Name, "signed by Jane Doe yesterday"),
            Some("Jane Doe".to_string())
        );
        assert_eq!(first(Category::Name, "signed by jane doe"), None);
        assert_eq!(first(Category::Name, "ACME CORP"), None);
    }

    #[test]
    fn test_address_suffixes_case_insensitive() {
        assert_eq!(
            first(Category::Address, "lives at 221 Baker Street, London"),
            Some("221 Baker Street".to_string())
        );
        assert_eq!(
            first(Category::Address, "ship to 42 elm ave"),
            Some("42 elm ave".to_string())
        );
        assert_eq!(first(Category::Address, "no street here"), None);
    }

    #[test]
    fn test_numeric_shapes() {
        assert_eq!(first(Category::ZipCode, "zip 90210"), Some("90210".to_string()));
        assert_eq!(
            first(Category::ZipCode, "zip 90210-1234"),
            Some("90210-1234".to_string())
        );
        assert_eq!(first(Category::Ssn, "ssn 123-45-6789"), Some("123-45-6789".to_string()));
        assert_eq!(
            first(Category::CreditCard, "card 4111-1111-1111-1111"),
            Some("4111-1111-1111-1111".to_string())
        );
        assert_eq!(
            first(Category::CreditCard, "card 4111111111111111"),
            Some("4111111111111111".to_string())
        );
    }

    #[test]
    fn test_word_boundaries_are_ascii() {
        assert_eq!(
            first(Category::Email, "contact éjohn@x.com now"),
            Some("john@x.com".to_string())
        );
        assert_eq!(first(Category::ZipCode, "code 90210é"), Some("90210".to_string()));
    }

    #[test]
    fn test_extract_all_in_document_order() {
        let matches = Recognizer::new(Category::Email).extract_all("b@y.org then a@x.com");
        let values: Vec<&str> = matches.iter().map(|m| m.value.as_str()).collect();
        assert_eq!(values, vec!["b@y.org", "a@x.com"]);
        assert_eq!(matches[0].start, 0);
        assert!(matches[1].start > matches[0].end);
    }
}
