//! Regex patterns for entity recognition.
//!
//! Matching is purely on shape: no checksum (Luhn), calendar or area-code
//! validation. Phone-shaped and SSN-shaped strings can overlap.
//!
//! Word boundaries are ASCII-only, so a match may sit directly against a
//! non-ASCII letter.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::form_data::Category;

lazy_static! {
    pub static ref EMAIL: Regex = Regex::new(
        r"(?-u:\b)[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}(?-u:\b)"
    ).unwrap();

    // Optional country code, then 3-3-4 with optional separators/parentheses
    pub static ref PHONE: Regex = Regex::new(
        r"(?:\+\d{1,3}[-. ]?)?\(?\d{3}\)?[-. ]?\d{3}[-. ]?\d{4}"
    ).unwrap();

    pub static ref DATE: Regex = Regex::new(
        r"(?-u:\b)\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}(?-u:\b)|(?-u:\b)\d{4}[/\-]\d{1,2}[/\-]\d{1,2}(?-u:\b)"
    ).unwrap();

    pub static ref NAME: Regex = Regex::new(
        r"(?-u:\b)[A-Z][a-z]+ [A-Z][a-z]+(?-u:\b)"
    ).unwrap();

    pub static ref ADDRESS: Regex = Regex::new(
        r"(?i)(?-u:\b)\d+\s+[A-Za-z\s]+(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr)(?-u:\b)"
    ).unwrap();

    pub static ref ZIP_CODE: Regex = Regex::new(
        r"(?-u:\b)\d{5}(?:-\d{4})?(?-u:\b)"
    ).unwrap();

    pub static ref SSN: Regex = Regex::new(
        r"(?-u:\b)\d{3}-\d{2}-\d{4}(?-u:\b)"
    ).unwrap();

    pub static ref CREDIT_CARD: Regex = Regex::new(
        r"(?-u:\b)\d{4}[- ]?\d{4}[- ]?\d{4}[- ]?\d{4}(?-u:\b)"
    ).unwrap();
}

/// Pattern used to recognize a category.
pub fn pattern_for(category: Category) -> &'static Regex {
    match category {
        Category::Email => &*EMAIL,
        Category::Phone => &*PHONE,
        Category::Date => &*DATE,
        Category::Name => &*NAME,
        Category::Address => &*ADDRESS,
        Category::ZipCode => &*ZIP_CODE,
        Category::Ssn => &*SSN,
        Category::CreditCard => &*CREDIT_CARD,
    }
}
