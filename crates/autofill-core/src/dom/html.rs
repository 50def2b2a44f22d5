//! HTML parsing into the document model and serialization back out.

use scraper::{ElementRef, Html, Node as HtmlNode};
use tracing::debug;

use super::{Document, Element, NodeData, NodeId, Result};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

impl Document {
    /// Parse a full HTML page. The `<body>` becomes the document root; the
    /// `<head>` is kept verbatim for serialization.
    pub fn parse_html(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Document::new();
        let body = doc.body();

        for child in parsed.root_element().children() {
            let Some(section) = ElementRef::wrap(child) else {
                continue;
            };
            match section.value().name() {
                "head" => doc.head_html = Some(section.inner_html()),
                "body" => {
                    if let NodeData::Element(element) = &mut doc.nodes[body.0].data {
                        copy_attrs(element, section);
                    }
                    doc.import_children(body, section);
                }
                _ => {}
            }
        }

        debug!("Parsed HTML document with {} nodes", doc.nodes.len());
        doc
    }

    /// Parse an HTML fragment and append its top-level nodes to `parent` as
    /// one mutation batch. Returns the inserted roots.
    pub fn insert_html(&mut self, parent: NodeId, html: &str) -> Result<Vec<NodeId>> {
        let fragment = Html::parse_fragment(html);
        let scratch = self.create_element("template");
        let roots = self.import_children(scratch, fragment.root_element());
        self.insert_children(parent, &roots)?;
        Ok(roots)
    }

    /// Build nodes for every child of `source` and link them under `parent`
    /// without publishing mutations.
    fn import_children(&mut self, parent: NodeId, source: ElementRef<'_>) -> Vec<NodeId> {
        let mut created = Vec::new();
        for child in source.children() {
            let id = match child.value() {
                HtmlNode::Text(text) => self.create_text(&**text),
                HtmlNode::Element(_) => {
                    let Some(child_ref) = ElementRef::wrap(child) else {
                        continue;
                    };
                    let id = self.create_element(child_ref.value().name());
                    if let NodeData::Element(element) = &mut self.nodes[id.0].data {
                        copy_attrs(element, child_ref);
                    }
                    self.import_children(id, child_ref);
                    id
                }
                _ => continue,
            };
            self.nodes[id.0].parent = Some(parent);
            self.nodes[parent.0].children.push(id);
            self.init_control_value(id);
            created.push(id);
        }
        created
    }

    /// Serialize the whole page, reflecting current control values.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n<html>");
        if let Some(head) = &self.head_html {
            out.push_str("<head>");
            out.push_str(head);
            out.push_str("</head>");
        }
        self.write_node(self.body, &mut out, false);
        out.push_str("</html>\n");
        out
    }

    /// Serialize one node and its subtree.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out, false);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String, raw: bool) {
        let Some(node) = self.node(id) else {
            return;
        };
        let element = match &node.data {
            NodeData::Text(text) => {
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&escape_text(text));
                }
                return;
            }
            NodeData::Element(element) => element,
        };

        out.push('<');
        out.push_str(&element.tag);
        for (name, value) in self.serialized_attrs(id, element) {
            out.push(' ');
            out.push_str(&name);
            out.push_str("=\"");
            out.push_str(&escape_attr(&value));
            out.push('"');
        }
        out.push('>');

        if VOID_ELEMENTS.contains(&element.tag.as_str()) {
            return;
        }

        if element.tag == "textarea" {
            out.push_str(&escape_text(element.value.as_deref().unwrap_or_default()));
        } else {
            let raw = RAW_TEXT_ELEMENTS.contains(&element.tag.as_str());
            for &child in &node.children {
                self.write_node(child, out, raw);
            }
        }

        out.push_str("</");
        out.push_str(&element.tag);
        out.push('>');
    }

    /// Attributes as written out: live values replace markup defaults.
    fn serialized_attrs(&self, id: NodeId, element: &Element) -> Vec<(String, String)> {
        let mut attrs: Vec<(String, String)> = element
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        match element.tag.as_str() {
            "input" => {
                let value = element.value.clone().unwrap_or_default();
                attrs.retain(|(k, _)| k != "value");
                if !value.is_empty() || element.attr("value").is_some() {
                    attrs.push(("value".to_string(), value));
                }
            }
            "option" => {
                if let Some(select_value) = self.enclosing_select_value(id) {
                    attrs.retain(|(k, _)| k != "selected");
                    if self.option_value(id) == select_value {
                        attrs.push(("selected".to_string(), String::new()));
                    }
                }
            }
            _ => {}
        }
        attrs.sort();
        attrs
    }

    fn enclosing_select_value(&self, option: NodeId) -> Option<&str> {
        let mut current = self.node(option).and_then(|n| n.parent);
        while let Some(id) = current {
            let element = self.element(id)?;
            if element.tag == "select" {
                return element.value.as_deref();
            }
            current = self.node(id).and_then(|n| n.parent);
        }
        None
    }
}

fn copy_attrs(element: &mut Element, source: ElementRef<'_>) {
    for (name, value) in source.value().attrs() {
        element.attrs.insert(name.to_ascii_lowercase(), value.to_string());
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Claim</title></head>
<body class="page">
  <form id="claim">
    <label for="email">Email</label>
    <input type="email" id="email" value="old@example.com">
    <textarea name="notes">Some &amp; notes</textarea>
    <select name="state">
      <option value="CA">California</option>
      <option value="NY" selected>New York</option>
    </select>
  </form>
</body>
</html>"#;

    #[test]
    fn test_parse_builds_controls_with_initial_values() {
        let doc = Document::parse_html(PAGE);

        let email = doc.get_element_by_id("email").unwrap();
        assert_eq!(doc.value(email), Some("old@example.com"));

        let textarea = doc
            .descendants(doc.body())
            .into_iter()
            .find(|&n| doc.element(n).map(|e| e.tag() == "textarea").unwrap_or(false))
            .unwrap();
        assert_eq!(doc.value(textarea), Some("Some & notes"));

        let select = doc
            .descendants(doc.body())
            .into_iter()
            .find(|&n| doc.element(n).and_then(|e| e.attr("name")) == Some("state"))
            .unwrap();
        assert_eq!(doc.value(select), Some("NY"));
        assert_eq!(doc.element(doc.body()).unwrap().attr("class"), Some("page"));
    }

    #[test]
    fn test_serialize_reflects_current_values() {
        let mut doc = Document::parse_html(PAGE);
        let email = doc.get_element_by_id("email").unwrap();
        doc.set_value(email, "new\"@example.com").unwrap();

        let html = doc.to_html();
        assert!(html.contains("<title>Claim</title>"));
        assert!(html.contains(r#"value="new&quot;@example.com""#));
        assert!(!html.contains("old@example.com"));
        assert!(html.contains("Some &amp; notes</textarea>"));
        assert!(html.contains(r#"<option selected="" value="NY">"#));
    }

    #[test]
    fn test_roundtrip_reparses_to_same_values() {
        let mut doc = Document::parse_html(PAGE);
        let email = doc.get_element_by_id("email").unwrap();
        doc.set_value(email, "a@b.com").unwrap();

        let reparsed = Document::parse_html(&doc.to_html());
        let email = reparsed.get_element_by_id("email").unwrap();
        assert_eq!(reparsed.value(email), Some("a@b.com"));
    }

    #[test]
    fn test_insert_html_publishes_one_batch() {
        let mut doc = Document::parse_html(PAGE);
        let mut rx = doc.subscribe();
        let form = doc.get_element_by_id("claim").unwrap();

        let roots = doc
            .insert_html(form, r#"<div><input type="tel" id="phone"></div> tail"#)
            .unwrap();

        assert_eq!(roots.len(), 2);
        let record = rx.try_recv().unwrap();
        assert_eq!(record.added, roots);
        assert!(record.removed.is_empty());
        assert!(rx.try_recv().is_err());
        assert!(doc.get_element_by_id("phone").is_some());
    }
}
