//! Mutable HTML document model.
//!
//! An arena of element and text nodes rooted at `<body>`, standing in for
//! the live page: form controls carry a current value, writes are recorded
//! as dispatched events, and structural changes are published to
//! subscribers as mutation batches.

mod html;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::trace;

use crate::error::DocumentError;

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Identity of a node within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An element node.
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attrs: BTreeMap<String, String>,
    /// Current value for form controls; `None` for every other element.
    value: Option<String>,
}

impl Element {
    fn new(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        let value = matches!(tag.as_str(), "input" | "textarea" | "select").then(String::new);
        Self {
            tag,
            attrs: BTreeMap::new(),
            value,
        }
    }

    /// Lower-cased tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The `id` attribute, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    pub fn is_control(&self) -> bool {
        self.value.is_some()
    }
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum NodeData {
    Element(Element),
    Text(String),
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn element(&self) -> Option<&Element> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            NodeData::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            NodeData::Element(_) => None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Kind of a dispatched notification event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Input,
    Change,
}

/// An event dispatched on a node, as page scripts would observe it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomEvent {
    pub target: NodeId,
    pub kind: EventKind,
    pub bubbles: bool,
}

/// One batch of structural changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationRecord {
    /// Roots of subtrees inserted under an attached parent.
    pub added: Vec<NodeId>,
    /// Roots of subtrees detached from the document.
    pub removed: Vec<NodeId>,
}

/// The live document.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    body: NodeId,
    head_html: Option<String>,
    events: Vec<DomEvent>,
    subscribers: Vec<UnboundedSender<MutationRecord>>,
}

impl Document {
    /// Create an empty document with just a `<body>`.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Element(Element::new("body")),
                parent: None,
                children: Vec::new(),
            }],
            body: NodeId(0),
            head_html: None,
            events: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id).and_then(Node::element)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(DocumentError::UnknownNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element(e) => Ok(e),
            NodeData::Text(_) => Err(DocumentError::NotAControl(id)),
        }
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(Element::new(tag)))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Set an attribute. Setting `value` on an `<input>` also sets its
    /// current value.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        let element = self.element_mut(id)?;
        let name = name.to_ascii_lowercase();
        if name == "value" && element.tag == "input" {
            element.value = Some(value.to_string());
        }
        element.attrs.insert(name, value.to_string());
        Ok(())
    }

    /// True when the node is reachable from the body.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == self.body {
                return true;
            }
            current = self.node(node_id).and_then(Node::parent);
        }
        false
    }

    /// Append `child` as the last child of `parent`, moving it if it
    /// already has a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_children(parent, &[child])
    }

    /// Append several nodes to `parent` as a single mutation batch.
    pub fn insert_children(&mut self, parent: NodeId, children: &[NodeId]) -> Result<()> {
        self.node_mut(parent)?;
        for &child in children {
            self.node_mut(child)?;
            if child == self.body || self.is_ancestor_or_self(child, parent) {
                return Err(DocumentError::Cycle(child));
            }
        }

        let mut record = MutationRecord::default();
        for &child in children {
            if let Some(old_parent) = self.nodes[child.0].parent {
                if self.is_attached(child) {
                    record.removed.push(child);
                }
                self.nodes[old_parent.0].children.retain(|&c| c != child);
            }
            self.nodes[child.0].parent = Some(parent);
            self.nodes[parent.0].children.push(child);
        }

        if self.is_attached(parent) {
            record.added.extend_from_slice(children);
            self.publish(record);
        } else if !record.removed.is_empty() {
            self.publish(record);
        }
        Ok(())
    }

    /// Detach a node (and its subtree) from its parent.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        let was_attached = self.is_attached(id);
        let parent = self.node_mut(id)?.parent.take();
        if let Some(parent) = parent {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
        if was_attached && id != self.body {
            self.publish(MutationRecord {
                added: Vec::new(),
                removed: vec![id],
            });
        }
        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.node(node_id).and_then(Node::parent);
        }
        false
    }

    /// The node and all its descendants in document (pre-)order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            let Some(node) = self.node(node_id) else {
                continue;
            };
            out.push(node_id);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// All descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut nodes = self.subtree(id);
        if !nodes.is_empty() {
            nodes.remove(0);
        }
        nodes
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self, id: NodeId) -> String {
        self.subtree(id)
            .into_iter()
            .filter_map(|n| self.node(n).and_then(Node::text))
            .collect()
    }

    /// First attached element whose `id` attribute equals `element_id`.
    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .find(|&n| self.element(n).and_then(Element::id) == Some(element_id))
    }

    /// First attached `<label>` whose `for` attribute equals `control_id`.
    pub fn label_for(&self, control_id: &str) -> Option<NodeId> {
        self.descendants(self.body).into_iter().find(|&n| {
            self.element(n)
                .map(|e| e.tag == "label" && e.attr("for") == Some(control_id))
                .unwrap_or(false)
        })
    }

    /// Current value of a form control.
    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.element(id).and_then(|e| e.value.as_deref())
    }

    /// Write a control's value, as assigning `.value` in a page would.
    ///
    /// A `<select>` only takes values that name one of its options;
    /// anything else leaves it empty.
    pub fn set_value(&mut self, id: NodeId, value: &str) -> Result<()> {
        let element = self.element(id).ok_or(DocumentError::NotAControl(id))?;
        if !element.is_control() {
            return Err(DocumentError::NotAControl(id));
        }
        if !self.is_attached(id) {
            return Err(DocumentError::Detached(id));
        }

        let stored = if element.tag == "select" {
            let known = self
                .options(id)
                .iter()
                .any(|&option| self.option_value(option) == value);
            if known { value.to_string() } else { String::new() }
        } else {
            value.to_string()
        };

        trace!("Setting value of {} to {:?}", id, stored);
        self.element_mut(id)?.value = Some(stored);
        Ok(())
    }

    /// `<option>` descendants of a select.
    fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|&n| self.element(n).map(|e| e.tag == "option").unwrap_or(false))
            .collect()
    }

    /// Value of an `<option>`: its `value` attribute, else its trimmed text.
    fn option_value(&self, option: NodeId) -> String {
        match self.element(option).and_then(|e| e.attr("value")) {
            Some(v) => v.to_string(),
            None => self.text_content(option).trim().to_string(),
        }
    }

    /// Record an event dispatched on a node.
    pub fn dispatch_event(&mut self, target: NodeId, kind: EventKind) {
        self.events.push(DomEvent {
            target,
            kind,
            bubbles: true,
        });
    }

    /// Events dispatched so far.
    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<DomEvent> {
        std::mem::take(&mut self.events)
    }

    /// Subscribe to structural mutations of the document.
    ///
    /// The channel is unbounded; batches are never dropped.
    pub fn subscribe(&mut self) -> UnboundedReceiver<MutationRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self, record: MutationRecord) {
        trace!(
            "Publishing mutation: {} added, {} removed",
            record.added.len(),
            record.removed.len()
        );
        self.subscribers.retain(|tx| tx.send(record.clone()).is_ok());
    }

    /// Finalize the current value of controls built from markup.
    fn init_control_value(&mut self, id: NodeId) {
        let Some(element) = self.element(id) else {
            return;
        };
        let initial = match element.tag.as_str() {
            "input" => element.attr("value").unwrap_or_default().to_string(),
            "textarea" => self.text_content(id),
            "select" => {
                let options = self.options(id);
                let selected = options
                    .iter()
                    .copied()
                    .find(|&o| self.element(o).and_then(|e| e.attr("selected")).is_some())
                    .or_else(|| options.first().copied());
                selected.map(|o| self.option_value(o)).unwrap_or_default()
            }
            _ => return,
        };
        if let Ok(element) = self.element_mut(id) {
            element.value = Some(initial);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
