//! Re-scan trigger driven by document mutations.

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, trace};

use super::{control_kind, FormClassifier, FormField};
use crate::dom::{Document, MutationRecord};

/// Watches a document for inserted candidate controls.
#[derive(Debug)]
pub struct RescanTrigger {
    rx: UnboundedReceiver<MutationRecord>,
}

impl RescanTrigger {
    /// Subscribe to structural mutations of `doc`.
    pub fn attach(doc: &mut Document) -> Self {
        Self { rx: doc.subscribe() }
    }

    /// Drain every queued batch and report whether any of them inserted a
    /// candidate control. Several batches coalesce into one answer.
    pub fn pending(&mut self, doc: &Document) -> bool {
        let mut batches = 0;
        let mut relevant = false;
        loop {
            match self.rx.try_recv() {
                Ok(record) => {
                    batches += 1;
                    relevant |= adds_candidates(doc, &record);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if batches > 0 {
            trace!("Drained {} mutation batches, relevant: {}", batches, relevant);
        }
        relevant
    }

    /// Re-classify the whole document if queued mutations added candidates.
    pub fn rescan(
        &mut self,
        doc: &Document,
        classifier: &mut FormClassifier,
    ) -> Option<Vec<FormField>> {
        if !self.pending(doc) {
            return None;
        }
        debug!("New form fields detected, re-scanning");
        Some(classifier.classify(doc))
    }

    /// Wait for the next mutation batch. Returns `None` once the document
    /// has been dropped and the queue is empty.
    pub async fn next_batch(&mut self) -> Option<MutationRecord> {
        self.rx.recv().await
    }
}

/// True when an added subtree root, or any of its descendants, is a
/// candidate control.
pub(crate) fn adds_candidates(doc: &Document, record: &MutationRecord) -> bool {
    record.added.iter().any(|&root| {
        doc.subtree(root)
            .into_iter()
            .any(|n| doc.element(n).and_then(control_kind).is_some())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FieldCategory;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<form id="f"><label for="e">Email</label><input type="text" id="e"></form>"#;

    #[test]
    fn test_inserted_input_triggers_rescan() {
        let mut doc = Document::parse_html(PAGE);
        let mut classifier = FormClassifier::new();
        let mut trigger = RescanTrigger::attach(&mut doc);
        assert_eq!(classifier.classify(&doc).len(), 1);

        let form = doc.get_element_by_id("f").unwrap();
        doc.insert_html(form, r#"<p>Phone number <input type="text" name="p"></p>"#)
            .unwrap();

        let fields = trigger.rescan(&doc, &mut classifier).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].category, FieldCategory::Phone);
        assert_eq!(fields[1].label, "Phone number");

        let full = FormClassifier::new().classify(&doc);
        assert_eq!(fields, full);
    }

    #[test]
    fn test_irrelevant_insertions_are_ignored() {
        let mut doc = Document::parse_html(PAGE);
        let mut trigger = RescanTrigger::attach(&mut doc);

        let form = doc.get_element_by_id("f").unwrap();
        doc.insert_html(form, "<p>Just text <b>bold</b></p>").unwrap();
        doc.insert_html(form, r#"<input type="checkbox">"#).unwrap();
        doc.remove(form).unwrap();

        assert!(!trigger.pending(&doc));
    }

    #[test]
    fn test_batches_coalesce() {
        let mut doc = Document::parse_html(PAGE);
        let mut classifier = FormClassifier::new();
        let mut trigger = RescanTrigger::attach(&mut doc);

        let body = doc.body();
        for _ in 0..3 {
            doc.insert_html(body, r#"<textarea></textarea>"#).unwrap();
        }

        let fields = trigger.rescan(&doc, &mut classifier).unwrap();
        assert_eq!(fields.len(), 4);
        assert!(trigger.rescan(&doc, &mut classifier).is_none());
    }

    #[test]
    fn test_detached_subtree_reported_on_attach() {
        let mut doc = Document::parse_html(PAGE);
        let mut trigger = RescanTrigger::attach(&mut doc);

        let wrapper = doc.create_element("div");
        let select = doc.create_element("select");
        doc.append_child(wrapper, select).unwrap();
        assert!(!trigger.pending(&doc));

        doc.append_child(doc.body(), wrapper).unwrap();
        assert!(trigger.pending(&doc));
    }

    #[tokio::test]
    async fn test_next_batch_awaits_mutation() {
        let mut doc = Document::new();
        let mut trigger = RescanTrigger::attach(&mut doc);

        let input = doc.create_element("input");
        doc.set_attribute(input, "type", "email").unwrap();
        doc.append_child(doc.body(), input).unwrap();

        let record = trigger.next_batch().await.unwrap();
        assert_eq!(record.added, vec![input]);
        assert!(adds_candidates(&doc, &record));

        drop(doc);
        assert!(trigger.next_batch().await.is_none());
    }
}
