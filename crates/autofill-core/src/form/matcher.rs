//! Field matcher: reconciles extracted values with classified fields.

use serde::Serialize;
use tracing::{debug, info, trace};

use super::FormField;
use crate::dom::{Document, EventKind, NodeId};
use crate::models::form_data::FormData;

/// The first weak signal that made a field a candidate for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSignal {
    Category,
    Label,
    Placeholder,
    Name,
    Id,
}

/// One write performed by the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchAssignment {
    pub key: String,
    pub value: String,
    pub node: NodeId,
    pub signal: MatchSignal,
}

/// Outcome of a match pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    /// Number of field writes; a field written for two keys counts twice.
    pub fields_changed: usize,
    pub assignments: Vec<MatchAssignment>,
}

/// Greedy, unscored matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMatcher;

impl FieldMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Why `field` is a candidate for `key`, if it is one.
    pub fn match_signal(&self, doc: &Document, field: &FormField, key: &str) -> Option<MatchSignal> {
        if field.category.as_str() == key {
            return Some(MatchSignal::Category);
        }

        let key = key.to_lowercase();
        let contains = |haystack: Option<&str>| {
            haystack
                .filter(|h| !h.is_empty())
                .map(|h| h.to_lowercase().contains(&key))
                .unwrap_or(false)
        };

        if contains(Some(field.label.as_str())) {
            return Some(MatchSignal::Label);
        }

        let element = doc.element(field.node)?;
        if contains(element.attr("placeholder")) {
            Some(MatchSignal::Placeholder)
        } else if contains(element.attr("name")) {
            Some(MatchSignal::Name)
        } else if contains(element.attr("id")) {
            Some(MatchSignal::Id)
        } else {
            None
        }
    }

    /// Write every entry of `data` into every field that matches its key.
    ///
    /// Entries are applied in mapping order, so a later key overwrites an
    /// earlier one on a shared field. Detached fields are skipped.
    pub fn apply(&self, doc: &mut Document, data: &FormData, fields: &[FormField]) -> MatchReport {
        let mut report = MatchReport::default();

        for (key, value) in data.iter() {
            let mut matched = 0;
            for field in fields {
                let Some(signal) = self.match_signal(doc, field, key) else {
                    continue;
                };
                if let Err(e) = doc.set_value(field.node, value) {
                    debug!("Skipping field {} for {:?}: {}", field.node, key, e);
                    continue;
                }
                doc.dispatch_event(field.node, EventKind::Input);
                doc.dispatch_event(field.node, EventKind::Change);

                trace!("Filled {} with {:?} via {:?}", field.node, key, signal);
                matched += 1;
                report.assignments.push(MatchAssignment {
                    key: key.to_string(),
                    value: value.to_string(),
                    node: field.node,
                    signal,
                });
            }
            debug!("Found {} matching fields for {:?}", matched, key);
        }

        report.fields_changed = report.assignments.len();
        info!("Filled {} form fields", report.fields_changed);
        report
    }

    /// Empty every attached field, notifying listeners the same way a fill
    /// does. Returns the number of fields cleared.
    pub fn clear(&self, doc: &mut Document, fields: &[FormField]) -> usize {
        let mut cleared = 0;
        for field in fields {
            if let Err(e) = doc.set_value(field.node, "") {
                debug!("Skipping field {} on clear: {}", field.node, e);
                continue;
            }
            doc.dispatch_event(field.node, EventKind::Input);
            doc.dispatch_event(field.node, EventKind::Change);
            cleared += 1;
        }
        info!("Cleared {} form fields", cleared);
        cleared
    }
}
