//! Core library for document-driven form autofill.
//!
//! This crate provides:
//! - Entity extraction (email, phone, date, name, address, zip code, SSN, credit card)
//! - A mutable HTML document model with events and mutation subscriptions
//! - Form field classification and weak-signal field matching
//! - Document decoders (plain text, Markdown, PDF, DOCX)
//! - A session that runs decode -> extract -> match per dropped file

pub mod decode;
pub mod dom;
pub mod error;
pub mod extract;
pub mod form;
pub mod models;
pub mod pipeline;

pub use decode::{DecoderRegistry, DocumentSource, FileKind, TextDecoder};
pub use dom::{Document, DomEvent, EventKind, MutationRecord, NodeId};
pub use error::{AutofillError, DecodeError, DocumentError, Result};
pub use extract::{EntityExtractor, ExtractionMatch, ExtractionResult};
pub use form::{
    ControlKind, FieldCategory, FieldMatcher, FormClassifier, FormField, MatchAssignment,
    MatchReport, MatchSignal, RescanTrigger,
};
pub use models::config::{AutofillConfig, DecodeConfig, ExtractionConfig, Settings};
pub use models::form_data::{Category, ExtractedValue, FormData};
pub use pipeline::{
    decode_and_extract, process_file, validate_source, FileOutcome, FillReport, ProcessResponse,
    Session,
};
