//! DOCX text extraction from `word/document.xml`.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;
use zip::ZipArchive;

use super::{FileKind, Result, TextDecoder};
use crate::error::DecodeError;

/// Upper bound on the uncompressed size of `word/document.xml`.
const MAX_XML_SIZE: u64 = 64 * 1024 * 1024;

/// Reads the text runs of a Word document, one line per paragraph.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxDecoder;

impl DocxDecoder {
    pub fn new() -> Self {
        Self
    }

    fn read_document_xml(&self, bytes: &[u8]) -> Result<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| DecodeError::DecodeFailure(format!("not a DOCX archive: {}", e)))?;

        let entry = archive
            .by_name("word/document.xml")
            .map_err(|_| DecodeError::DecodeFailure("missing word/document.xml".to_string()))?;

        if entry.size() > MAX_XML_SIZE {
            return Err(DecodeError::DecodeFailure(format!(
                "word/document.xml is {} bytes, limit is {}",
                entry.size(),
                MAX_XML_SIZE
            )));
        }

        let mut xml = String::new();
        entry
            .take(MAX_XML_SIZE)
            .read_to_string(&mut xml)
            .map_err(|e| DecodeError::DecodeFailure(e.to_string()))?;
        Ok(xml)
    }
}

impl TextDecoder for DocxDecoder {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn supports(&self, kind: FileKind) -> bool {
        kind == FileKind::Docx
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        let xml = self.read_document_xml(bytes)?;
        let text = text_runs(&xml)?;
        debug!("Extracted {} characters from DOCX", text.len());
        Ok(text)
    }
}

/// Collect `w:t` contents, breaking lines at paragraph ends and `w:br`.
fn text_runs(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().expand_empty_elements = false;

    let mut text = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => text.push('\n'),
                b"w:tc" => text.push('\t'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let run = e
                    .unescape()
                    .map_err(|e| DecodeError::DecodeFailure(format!("XML text error: {}", e)))?;
                text.push_str(&run);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DecodeError::DecodeFailure(format!(
                    "XML parsing error at {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn docx(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, body) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extracts_paragraph_text() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Claimant: </w:t></w:r><w:r><w:t>Jane Doe</w:t></w:r></w:p>
    <w:p><w:r><w:t>Email:</w:t><w:tab/><w:t>jane&amp;co@example.com</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let bytes = docx(&[("[Content_Types].xml", "<Types/>"), ("word/document.xml", xml)]);

        let text = DocxDecoder::new().decode(&bytes).unwrap();
        assert_eq!(text, "Claimant: Jane Doe\nEmail:\tjane&co@example.com\n");
    }

    #[test]
    fn test_missing_document_xml() {
        let bytes = docx(&[("word/styles.xml", "<w:styles/>")]);
        let err = DocxDecoder::new().decode(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::DecodeFailure(msg) if msg.contains("word/document.xml")));
    }

    #[test]
    fn test_not_a_zip() {
        let err = DocxDecoder::new().decode(b"plain bytes").unwrap_err();
        assert!(matches!(err, DecodeError::DecodeFailure(_)));
    }
}
