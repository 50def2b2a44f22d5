//! End-to-end processing: decode, extract, classify and fill.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::decode::{DecoderRegistry, DocumentSource};
use crate::dom::Document;
use crate::error::DecodeError;
use crate::extract::{EntityExtractor, ExtractionResult};
use crate::form::{FieldMatcher, FormClassifier, FormField, MatchReport, RescanTrigger};
use crate::models::config::{AutofillConfig, Settings};
use crate::models::form_data::FormData;

/// Reply to one processing request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    #[serde(default)]
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_data: Option<FormData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessResponse {
    pub fn succeeded(file_name: impl Into<String>, form_data: FormData) -> Self {
        Self {
            success: true,
            file_name: file_name.into(),
            form_data: Some(form_data),
            ..Default::default()
        }
    }

    pub fn failed(file_name: impl Into<String>, error: impl ToString) -> Self {
        Self {
            success: false,
            file_name: file_name.into(),
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.extracted_text = Some(text.into());
        self
    }

    /// Extracted data, empty on failure.
    pub fn data(&self) -> FormData {
        self.form_data.clone().unwrap_or_default()
    }

    /// One human-readable line describing the outcome.
    pub fn message(&self) -> String {
        if !self.success {
            let error = self.error.as_deref().unwrap_or("unknown error");
            return format!("Error processing {}: {}", self.file_name, error);
        }
        match self.form_data.as_ref().map(FormData::len).unwrap_or(0) {
            0 => format!("No form data found in {}", self.file_name),
            1 => format!("Extracted 1 field from {}", self.file_name),
            n => format!("Extracted {} fields from {}", n, self.file_name),
        }
    }
}

/// Feedback after one match pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillReport {
    pub file_name: String,
    pub fields_changed: usize,
}

impl FillReport {
    pub fn message(&self) -> String {
        match self.fields_changed {
            0 => format!("No matching form fields for {}", self.file_name),
            1 => format!("Form filled from {}: 1 field updated", self.file_name),
            n => format!("Form filled from {}: {} fields updated", self.file_name, n),
        }
    }
}

/// Everything that happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutcome {
    pub response: ProcessResponse,
    /// Present when the file decoded and a match pass ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<FillReport>,
}

/// Check a source against the allow-list, then the size limit.
///
/// Runs before any decoding, local or remote.
pub fn validate_source(config: &AutofillConfig, source: &DocumentSource) -> Result<(), DecodeError> {
    if !source.is_allowed(&config.settings) {
        return Err(DecodeError::UnsupportedFileKind {
            kind: source.kind_label(),
        });
    }

    let limit = config.decode.max_file_size;
    if source.size() > limit {
        return Err(DecodeError::FileTooLarge {
            size: source.size(),
            limit,
        });
    }
    Ok(())
}

fn decode_checked(
    config: &AutofillConfig,
    registry: &DecoderRegistry,
    source: &DocumentSource,
) -> Result<String, DecodeError> {
    validate_source(config, source)?;
    registry.decode(source)
}

/// Decode a source and run the configured extractor over its text.
pub fn decode_and_extract(
    config: &AutofillConfig,
    registry: &DecoderRegistry,
    source: &DocumentSource,
) -> Result<ExtractionResult, DecodeError> {
    let text = decode_checked(config, registry, source)?;
    Ok(EntityExtractor::from_config(&config.extraction).run(&text))
}

/// Handle one processing request. Failures are reported in the response.
pub fn process_file(
    config: &AutofillConfig,
    registry: &DecoderRegistry,
    source: &DocumentSource,
) -> ProcessResponse {
    info!("Processing {}", source.name);

    let text = match decode_checked(config, registry, source) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to process {}: {}", source.name, e);
            return ProcessResponse::failed(&source.name, e);
        }
    };

    let result = EntityExtractor::from_config(&config.extraction).run(&text);
    if result.is_empty() {
        debug!("No form data found in {}", source.name);
    }

    let response = ProcessResponse::succeeded(&source.name, result.form_data);
    if config.extraction.include_text {
        response.with_text(text)
    } else {
        response
    }
}

/// A page under autofill control.
///
/// Owns the document, the classifier's side table and the re-scan trigger.
/// Every operation takes `&mut self`, so classification and matching never
/// interleave.
#[derive(Debug)]
pub struct Session {
    document: Document,
    classifier: FormClassifier,
    fields: Vec<FormField>,
    trigger: RescanTrigger,
    matcher: FieldMatcher,
}

impl Session {
    /// Take control of a page and run the initial classification.
    pub fn new(mut document: Document) -> Self {
        let trigger = RescanTrigger::attach(&mut document);
        let mut classifier = FormClassifier::new();
        let fields = classifier.classify(&document);
        Self {
            document,
            classifier,
            fields,
            trigger,
            matcher: FieldMatcher::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable access for page scripts. Structural changes are picked up by
    /// the next `sync`.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Fields from the latest classification pass.
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn classifier(&self) -> &FormClassifier {
        &self.classifier
    }

    /// Force a full re-classification; returns the number of fields found.
    pub fn detect_forms(&mut self) -> usize {
        // Queued mutations are covered by this pass.
        self.trigger.pending(&self.document);
        self.fields = self.classifier.classify(&self.document);
        self.fields.len()
    }

    /// Apply queued mutations. Returns `true` when a re-scan ran.
    ///
    /// With `auto_detect` off the queue is left untouched.
    pub fn sync(&mut self, settings: &Settings) -> bool {
        if !settings.auto_detect {
            return false;
        }
        match self.trigger.rescan(&self.document, &mut self.classifier) {
            Some(fields) => {
                self.fields = fields;
                true
            }
            None => false,
        }
    }

    /// Fill matching fields with `data`. A disabled session changes nothing.
    pub fn fill(&mut self, settings: &Settings, data: &FormData) -> MatchReport {
        if !settings.enabled {
            debug!("Autofill disabled, skipping fill");
            return MatchReport::default();
        }
        self.sync(settings);
        self.matcher.apply(&mut self.document, data, &self.fields)
    }

    /// Empty every classified field. Returns the number cleared.
    pub fn clear(&mut self, settings: &Settings) -> usize {
        self.sync(settings);
        self.matcher.clear(&mut self.document, &self.fields)
    }

    /// Decode, extract and fill from one file.
    pub fn process(
        &mut self,
        config: &AutofillConfig,
        registry: &DecoderRegistry,
        source: &DocumentSource,
    ) -> FileOutcome {
        let response = process_file(config, registry, source);
        self.apply_response(&config.settings, response)
    }

    /// Fill from a response produced elsewhere, e.g. by a remote server.
    /// Failed responses leave the page untouched.
    pub fn apply_response(&mut self, settings: &Settings, response: ProcessResponse) -> FileOutcome {
        let fill = response.success.then(|| {
            let report = self.fill(settings, &response.data());
            FillReport {
                file_name: response.file_name.clone(),
                fields_changed: report.fields_changed,
            }
        });
        FileOutcome { response, fill }
    }

    /// Process files one after another, each fully before the next.
    pub fn process_all<'a>(
        &mut self,
        config: &AutofillConfig,
        registry: &DecoderRegistry,
        sources: impl IntoIterator<Item = &'a DocumentSource>,
    ) -> Vec<FileOutcome> {
        sources
            .into_iter()
            .map(|source| self.process(config, registry, source))
            .collect()
    }
}
