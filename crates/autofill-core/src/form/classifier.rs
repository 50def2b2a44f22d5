//! Form classifier: finds candidate controls and infers label and category.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::{ControlKind, FieldCategory, FormField};
use crate::dom::{Document, Element, Node, NodeId};

/// Annotation stored in the classifier's side table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMetadata {
    pub control: ControlKind,
    pub category: FieldCategory,
    pub label: String,
}

/// Classifies candidate controls of a document.
///
/// Owns a side table of per-node metadata which is rebuilt from scratch on
/// every pass; nothing is written to the elements themselves.
#[derive(Debug, Default)]
pub struct FormClassifier {
    table: HashMap<NodeId, FieldMetadata>,
}

impl FormClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify every attached candidate control, in document order.
    pub fn classify(&mut self, doc: &Document) -> Vec<FormField> {
        self.table.clear();

        let mut fields = Vec::new();
        for node in doc.descendants(doc.body()) {
            let Some(control) = doc.element(node).and_then(control_kind) else {
                continue;
            };

            let label = infer_label(doc, node);
            let category = infer_category(control, &label);
            trace!("{} {} labelled {:?} -> {}", node, control, label, category);

            self.table.insert(
                node,
                FieldMetadata {
                    control,
                    category,
                    label: label.clone(),
                },
            );
            fields.push(FormField {
                node,
                control,
                category,
                label,
            });
        }

        debug!("Found {} form fields", fields.len());
        fields
    }

    /// Metadata from the latest pass.
    pub fn metadata(&self, node: NodeId) -> Option<&FieldMetadata> {
        self.table.get(&node)
    }

    /// Number of fields found by the latest pass.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Candidate kind of an element, if it is one of the eligible controls.
///
/// `<input>` elements qualify only with an explicit `type` of text, email,
/// tel, date or number.
pub fn control_kind(element: &Element) -> Option<ControlKind> {
    match element.tag() {
        "textarea" => Some(ControlKind::Textarea),
        "select" => Some(ControlKind::Select),
        "input" => match element.attr("type")?.trim().to_ascii_lowercase().as_str() {
            "text" => Some(ControlKind::Text),
            "email" => Some(ControlKind::Email),
            "tel" => Some(ControlKind::Tel),
            "date" => Some(ControlKind::Date),
            "number" => Some(ControlKind::Number),
            _ => None,
        },
        _ => None,
    }
}

/// Human-readable label of a control.
///
/// Uses the text of a `<label for=id>` when one exists and is non-blank,
/// otherwise the first non-blank direct text child of the parent.
pub fn infer_label(doc: &Document, node: NodeId) -> String {
    if let Some(id) = doc.element(node).and_then(Element::id) {
        if let Some(label) = doc.label_for(id) {
            let text = doc.text_content(label);
            let text = text.trim();
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }

    doc.node(node)
        .and_then(Node::parent)
        .and_then(|parent| doc.node(parent))
        .and_then(|parent| {
            parent
                .children()
                .iter()
                .filter_map(|&c| doc.node(c).and_then(Node::text))
                .map(str::trim)
                .find(|t| !t.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_default()
}

/// Fixed decision list; the first rule that matches wins.
pub fn infer_category(control: ControlKind, label: &str) -> FieldCategory {
    let label = label.to_lowercase();

    if control == ControlKind::Email || label.contains("email") {
        FieldCategory::Email
    } else if control == ControlKind::Tel || label.contains("phone") {
        FieldCategory::Phone
    } else if control == ControlKind::Date || label.contains("date") {
        FieldCategory::Date
    } else if control == ControlKind::Number
        || label.contains("amount")
        || label.contains("price")
    {
        FieldCategory::Number
    } else if label.contains("name") {
        FieldCategory::Name
    } else if label.contains("address") {
        FieldCategory::Address
    } else {
        FieldCategory::Unknown
    }
}
