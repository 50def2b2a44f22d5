//! Error types for the autofill-core library.

use thiserror::Error;

use crate::dom::NodeId;

/// Main error type for the autofill library.
#[derive(Error, Debug)]
pub enum AutofillError {
    /// Document decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Document model error.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised at the decoding boundary.
///
/// These are the only failures a processing request can surface; extraction
/// and classification degrade to empty results instead.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The file kind is not accepted by the settings or has no decoder.
    #[error("unsupported file type: {kind}")]
    UnsupportedFileKind { kind: String },

    /// The file exceeds the configured size limit.
    #[error("file size {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    /// The document is encrypted and cannot be opened.
    #[error("document is encrypted")]
    Encrypted,

    /// The decoder failed to read or parse the bytes.
    #[error("failed to decode document: {0}")]
    DecodeFailure(String),
}

/// Errors raised by low-level document mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The node id does not exist in this document.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The node is no longer attached to the document body.
    #[error("node {0} is detached")]
    Detached(NodeId),

    /// The node is not a form control and has no value.
    #[error("node {0} is not a form control")]
    NotAControl(NodeId),

    /// The operation would create a cycle in the tree.
    #[error("cannot insert node {0} into its own subtree")]
    Cycle(NodeId),
}

/// Result type for the autofill library.
pub type Result<T> = std::result::Result<T, AutofillError>;
