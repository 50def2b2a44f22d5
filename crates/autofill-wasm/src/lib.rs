//! WASM bindings for document-driven form autofill.
//!
//! This crate provides WebAssembly bindings for use in browsers. Pages are
//! passed in as HTML and returned filled; PDF and DOCX decoding is not part
//! of this build, so text and Markdown are the only local file kinds.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use autofill_core::{
    process_file, AutofillConfig, DecoderRegistry, Document, DocumentSource, EntityExtractor,
    FormData, Session, Settings,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Serialize maps as plain objects rather than `Map`s.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn form_data_from_js(value: JsValue) -> Result<FormData, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Extract the category -> value mapping from text.
#[wasm_bindgen]
pub fn extract_form_data(text: &str) -> Result<JsValue, JsValue> {
    to_js(&EntityExtractor::new().extract(text))
}

/// Process a dropped file with default settings; returns a process response.
#[wasm_bindgen]
pub fn process_text_file(name: &str, bytes: &[u8]) -> Result<JsValue, JsValue> {
    let source = DocumentSource::new(name, bytes.to_vec());
    let response = process_file(&AutofillConfig::default(), &DecoderRegistry::new(), &source);
    to_js(&response)
}

/// Classify the form fields of an HTML page.
#[wasm_bindgen]
pub fn classify_html(html: &str) -> Result<JsValue, JsValue> {
    let session = Session::new(Document::parse_html(html));
    to_js(session.fields())
}

/// Fill an HTML page from a `{key: value}` object and return the new HTML.
#[wasm_bindgen]
pub fn fill_html(html: &str, form_data: JsValue) -> Result<String, JsValue> {
    let data = form_data_from_js(form_data)?;
    let mut session = Session::new(Document::parse_html(html));
    session.fill(&Settings::default(), &data);
    Ok(session.into_document().to_html())
}

/// A page kept alive across several drops.
#[wasm_bindgen]
pub struct AutofillPage {
    session: Session,
    config: AutofillConfig,
    registry: DecoderRegistry,
}

#[wasm_bindgen]
impl AutofillPage {
    /// Load a page and detect its fields.
    #[wasm_bindgen(constructor)]
    pub fn new(html: &str) -> Self {
        Self {
            session: Session::new(Document::parse_html(html)),
            config: AutofillConfig::default(),
            registry: DecoderRegistry::new(),
        }
    }

    /// Replace the settings from a JSON string such as `{"enabled": false}`.
    #[wasm_bindgen]
    pub fn set_settings(&mut self, json: &str) -> Result<(), JsValue> {
        self.config.settings =
            serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(())
    }

    /// Re-run classification; returns the number of fields found.
    #[wasm_bindgen]
    pub fn detect_forms(&mut self) -> usize {
        self.session.detect_forms()
    }

    /// Classified fields.
    #[wasm_bindgen]
    pub fn fields(&mut self) -> Result<JsValue, JsValue> {
        self.session.sync(&self.config.settings);
        to_js(self.session.fields())
    }

    /// Append an HTML fragment to the element with the given id, as a page
    /// script would.
    #[wasm_bindgen]
    pub fn insert_html(&mut self, parent_id: &str, html: &str) -> Result<(), JsValue> {
        let doc = self.session.document_mut();
        let parent = doc
            .get_element_by_id(parent_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element with id {}", parent_id)))?;
        doc.insert_html(parent, html)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(())
    }

    /// Fill from a `{key: value}` object; returns the number of writes.
    #[wasm_bindgen]
    pub fn fill(&mut self, form_data: JsValue) -> Result<usize, JsValue> {
        let data = form_data_from_js(form_data)?;
        Ok(self.session.fill(&self.config.settings, &data).fields_changed)
    }

    /// Process a dropped file and fill the page; returns the file outcome.
    #[wasm_bindgen]
    pub fn process_file(&mut self, name: &str, bytes: &[u8]) -> Result<JsValue, JsValue> {
        let source = DocumentSource::new(name, bytes.to_vec());
        let outcome = self.session.process(&self.config, &self.registry, &source);
        to_js(&outcome)
    }

    /// Empty every detected field; returns the number cleared.
    #[wasm_bindgen]
    pub fn clear(&mut self) -> usize {
        self.session.clear(&self.config.settings)
    }

    /// Current page HTML with live values.
    #[wasm_bindgen]
    pub fn to_html(&self) -> String {
        self.session.document().to_html()
    }
}
