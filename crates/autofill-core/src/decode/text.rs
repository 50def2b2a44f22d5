//! Plain text and Markdown decoder.

use super::{FileKind, Result, TextDecoder};
use crate::error::DecodeError;

/// Decodes UTF-8 text files. Markdown is passed through unrendered.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextDecoder;

impl TextDecoder for PlainTextDecoder {
    fn name(&self) -> &'static str {
        "text"
    }

    fn supports(&self, kind: FileKind) -> bool {
        matches!(kind, FileKind::PlainText | FileKind::Markdown)
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| DecodeError::DecodeFailure(format!("invalid UTF-8: {}", e)))
    }
}
