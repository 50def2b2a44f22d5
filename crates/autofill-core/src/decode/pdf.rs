//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::debug;

use super::{FileKind, Result, TextDecoder};
use crate::error::DecodeError;

/// Extracts the text layer of a PDF. Scanned pages yield no text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfDecoder;

impl PdfDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Load the document, decrypting it with the empty password if needed,
    /// and return the bytes pdf-extract should read.
    fn prepare(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut doc = Document::load_mem(data).map_err(|e| DecodeError::DecodeFailure(e.to_string()))?;

        let bytes = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(DecodeError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| DecodeError::DecodeFailure(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(DecodeError::DecodeFailure("PDF has no pages".to_string()));
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(bytes)
    }
}

impl TextDecoder for PdfDecoder {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn supports(&self, kind: FileKind) -> bool {
        kind == FileKind::Pdf
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        let bytes = self.prepare(bytes)?;
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| DecodeError::DecodeFailure(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_only_pdf() {
        assert!(PdfDecoder::new().supports(FileKind::Pdf));
        assert!(!PdfDecoder::new().supports(FileKind::Docx));
    }

    #[test]
    fn test_garbage_is_decode_failure() {
        let err = PdfDecoder::new().decode(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, DecodeError::DecodeFailure(_)));
    }
}
