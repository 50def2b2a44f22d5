//! Entity extractor running every recognizer in priority order.

use instant::Instant;

use tracing::{debug, info, trace};

use super::{ExtractionMatch, FieldExtractor, Recognizer};
use crate::models::config::ExtractionConfig;
use crate::models::form_data::{Category, FormData};

/// Result of an extraction pass.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    /// One representative value per category found.
    pub form_data: FormData,
    /// The representative matches with their positions, in priority order.
    pub matches: Vec<ExtractionMatch>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    /// True when no category matched. This is a normal outcome, not an error.
    pub fn is_empty(&self) -> bool {
        self.form_data.is_empty()
    }
}

/// Extracts typed values from raw text.
///
/// Recognizers are independent: a substring may be claimed by several
/// categories (e.g. a phone number that is also zip-shaped).
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    recognizers: Vec<Recognizer>,
}

impl EntityExtractor {
    /// Create an extractor running every category.
    pub fn new() -> Self {
        Self::with_categories(Category::ALL)
    }

    /// Create an extractor for a subset of categories.
    ///
    /// Duplicates are removed and priority order is restored.
    pub fn with_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut categories: Vec<Category> = categories.into_iter().collect();
        categories.sort();
        categories.dedup();

        Self {
            recognizers: categories.into_iter().map(Recognizer::new).collect(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::with_categories(config.categories.iter().copied())
    }

    /// Categories this extractor recognizes, in priority order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.recognizers.iter().map(Recognizer::category)
    }

    /// Extract the category -> value mapping from text.
    pub fn extract(&self, text: &str) -> FormData {
        self.run(text).form_data
    }

    /// Extract with match positions and timing.
    pub fn run(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();

        info!("Extracting entities from {} characters of text", text.len());

        let mut result = ExtractionResult::default();
        for recognizer in &self.recognizers {
            match recognizer.extract(text) {
                Some(found) => {
                    trace!(
                        "{} matched {:?} at {}..{}",
                        found.category,
                        found.value,
                        found.start,
                        found.end
                    );
                    if result.form_data.insert(found.category.as_str(), found.value.as_str()) {
                        result.matches.push(found);
                    }
                }
                None => trace!("{} found no match", recognizer.category()),
            }
        }

        result.processing_time_ms = start.elapsed().as_millis() as u64;

        debug!(
            "Extracted {} categories in {}ms",
            result.form_data.len(),
            result.processing_time_ms
        );

        result
    }

    /// Every match of every recognizer, grouped by category priority and
    /// ordered by offset within a category.
    pub fn extract_all(&self, text: &str) -> Vec<ExtractionMatch> {
        self.recognizers
            .iter()
            .flat_map(|r| r.extract_all(text))
            .collect()
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}
