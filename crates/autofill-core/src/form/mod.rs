//! Form field classification, matching and re-scan triggering.

mod classifier;
mod matcher;
mod rescan;

pub use classifier::{control_kind, infer_category, infer_label, FieldMetadata, FormClassifier};
pub use matcher::{FieldMatcher, MatchAssignment, MatchReport, MatchSignal};
pub use rescan::RescanTrigger;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;

/// Semantic type inferred for a form control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCategory {
    Email,
    Phone,
    Date,
    Number,
    Name,
    Address,
    #[default]
    Unknown,
}

impl FieldCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldCategory::Email => "email",
            FieldCategory::Phone => "phone",
            FieldCategory::Date => "date",
            FieldCategory::Number => "number",
            FieldCategory::Name => "name",
            FieldCategory::Address => "address",
            FieldCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of interactive controls eligible for autofill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    Text,
    Email,
    Tel,
    Date,
    Number,
    Textarea,
    Select,
}

impl ControlKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlKind::Text => "text",
            ControlKind::Email => "email",
            ControlKind::Tel => "tel",
            ControlKind::Date => "date",
            ControlKind::Number => "number",
            ControlKind::Textarea => "textarea",
            ControlKind::Select => "select",
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate control with its derived annotations.
///
/// Annotations are a snapshot of one classification pass; any document
/// mutation may invalidate them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub node: NodeId,
    pub control: ControlKind,
    pub category: FieldCategory,
    pub label: String,
}
