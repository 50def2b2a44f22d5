//! Document decoding: file kind resolution and text decoders.

#[cfg(feature = "docx")]
mod docx;
#[cfg(feature = "pdf")]
mod pdf;
mod text;

#[cfg(feature = "docx")]
pub use docx::DocxDecoder;
#[cfg(feature = "pdf")]
pub use pdf::PdfDecoder;
pub use text::PlainTextDecoder;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::models::config::Settings;

/// Result type for decoding.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Kinds of files a user can drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    PlainText,
    Markdown,
    Pdf,
    Jpeg,
    Png,
    /// Legacy binary Word document (`.doc`).
    Word,
    Docx,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::PlainText => "txt",
            FileKind::Markdown => "md",
            FileKind::Pdf => "pdf",
            FileKind::Jpeg => "jpeg",
            FileKind::Png => "png",
            FileKind::Word => "doc",
            FileKind::Docx => "docx",
        }
    }

    /// File extensions associated with this kind.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileKind::PlainText => &["txt"],
            FileKind::Markdown => &["md", "markdown"],
            FileKind::Pdf => &["pdf"],
            FileKind::Jpeg => &["jpg", "jpeg"],
            FileKind::Png => &["png"],
            FileKind::Word => &["doc"],
            FileKind::Docx => &["docx"],
        }
    }

    /// Resolve from a MIME type, ignoring parameters such as `charset`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" => Some(FileKind::Pdf),
            "image/jpeg" | "image/jpg" => Some(FileKind::Jpeg),
            "image/png" => Some(FileKind::Png),
            "application/msword" => Some(FileKind::Word),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(FileKind::Docx)
            }
            "text/plain" => Some(FileKind::PlainText),
            "text/markdown" | "text/x-markdown" => Some(FileKind::Markdown),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        [
            FileKind::PlainText,
            FileKind::Markdown,
            FileKind::Pdf,
            FileKind::Jpeg,
            FileKind::Png,
            FileKind::Word,
            FileKind::Docx,
        ]
        .into_iter()
        .find(|kind| kind.extensions().contains(&ext.as_str()))
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dropped file: name, optional MIME type and raw bytes.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl DocumentSource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read a file from disk; the MIME type is left to extension lookup.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    /// Lower-cased extension of the file name.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .filter(|e| !e.is_empty())
    }

    /// Resolve the kind from the MIME type, falling back to the extension.
    pub fn kind(&self) -> Option<FileKind> {
        self.mime
            .as_deref()
            .and_then(FileKind::from_mime)
            .or_else(|| self.extension().as_deref().and_then(FileKind::from_extension))
    }

    /// Label used in errors: the extension, else the MIME type.
    pub fn kind_label(&self) -> String {
        self.extension()
            .or_else(|| self.mime.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Check the file against the settings allow-list.
    ///
    /// Entries may name an extension or a MIME kind; a MIME kind matches on
    /// its essence (`text/plain`) or its subtype (`pdf`).
    pub fn is_allowed(&self, settings: &Settings) -> bool {
        if let Some(essence) = self.mime_essence() {
            let subtype = essence.rsplit('/').next().unwrap_or_default();
            if settings.allows(&essence) || settings.allows(subtype) {
                return true;
            }
        }

        match self.extension() {
            Some(ext) => settings.allows(&ext),
            None => self
                .kind()
                .map(|kind| kind.extensions().iter().any(|e| settings.allows(e)))
                .unwrap_or(false),
        }
    }

    /// MIME type without parameters, lower-cased.
    fn mime_essence(&self) -> Option<String> {
        self.mime
            .as_deref()
            .and_then(|m| m.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase())
            .filter(|m| m.contains('/'))
    }
}

/// Turns raw bytes of one or more file kinds into UTF-8 text.
pub trait TextDecoder: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this decoder handles `kind`.
    fn supports(&self, kind: FileKind) -> bool;

    /// Decode the bytes into text.
    fn decode(&self, bytes: &[u8]) -> Result<String>;
}

/// Ordered set of decoders; the first one supporting a kind wins.
pub struct DecoderRegistry {
    decoders: Vec<Box<dyn TextDecoder>>,
}

impl DecoderRegistry {
    /// Create an empty registry.
    pub fn empty() -> Self {
        Self {
            decoders: Vec::new(),
        }
    }

    /// Create a registry with every decoder compiled into this build.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(PlainTextDecoder);
        #[cfg(feature = "pdf")]
        registry.register(PdfDecoder::new());
        #[cfg(feature = "docx")]
        registry.register(DocxDecoder::new());
        registry
    }

    pub fn register(&mut self, decoder: impl TextDecoder + 'static) {
        self.decoders.push(Box::new(decoder));
    }

    pub fn with_decoder(mut self, decoder: impl TextDecoder + 'static) -> Self {
        self.register(decoder);
        self
    }

    /// Whether some decoder handles `kind`.
    pub fn supports(&self, kind: FileKind) -> bool {
        self.decoders.iter().any(|d| d.supports(kind))
    }

    /// Decode a source to text.
    pub fn decode(&self, source: &DocumentSource) -> Result<String> {
        let Some(kind) = source.kind() else {
            return Err(DecodeError::UnsupportedFileKind {
                kind: source.kind_label(),
            });
        };

        let Some(decoder) = self.decoders.iter().find(|d| d.supports(kind)) else {
            warn!("No decoder for {} ({})", source.name, kind);
            return Err(DecodeError::UnsupportedFileKind {
                kind: kind.to_string(),
            });
        };

        debug!("Decoding {} with {} decoder", source.name, decoder.name());
        decoder.decode(&source.bytes)
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.decoders.iter().map(|d| d.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mime_takes_precedence() {
        let source = DocumentSource::new("scan.txt", b"x".to_vec()).with_mime("application/pdf");
        assert_eq!(source.kind(), Some(FileKind::Pdf));

        let source = DocumentSource::new("notes.MD", b"x".to_vec()).with_mime("application/octet-stream");
        assert_eq!(source.kind(), Some(FileKind::Markdown));

        let source = DocumentSource::new("a", b"x".to_vec()).with_mime("text/plain; charset=utf-8");
        assert_eq!(source.kind(), Some(FileKind::PlainText));
    }

    #[test]
    fn test_extension_lookup() {
        assert_eq!(FileKind::from_extension("JPG"), Some(FileKind::Jpeg));
        assert_eq!(FileKind::from_extension(".docx"), Some(FileKind::Docx));
        assert_eq!(FileKind::from_extension("exe"), None);
    }

    #[test]
    fn test_allow_list() {
        let settings = Settings::default();
        assert!(DocumentSource::new("a.pdf", vec![]).is_allowed(&settings));
        assert!(DocumentSource::new("a", vec![]).with_mime("text/plain").is_allowed(&settings));
        assert!(!DocumentSource::new("a.exe", vec![]).is_allowed(&settings));
        assert!(!DocumentSource::new("a.markdown", vec![]).is_allowed(&settings));
        assert!(!DocumentSource::new("noext", vec![]).is_allowed(&settings));
    }

    #[test]
    fn test_allow_list_mime_entries() {
        let settings = Settings {
            supported_file_types: ["text/plain".to_string()].into_iter().collect(),
            ..Settings::default()
        };
        let notes = DocumentSource::new("notes.txt", vec![]);
        assert!(!notes.is_allowed(&settings));
        assert!(notes.clone().with_mime("text/plain").is_allowed(&settings));
        assert!(DocumentSource::new("notes.txt", vec![])
            .with_mime("Text/Plain; charset=utf-8")
            .is_allowed(&settings));
        assert!(!DocumentSource::new("scan.pdf", vec![])
            .with_mime("application/pdf")
            .is_allowed(&settings));

        // Default entries are bare extensions, which also match a subtype.
        let source = DocumentSource::new("upload", vec![]).with_mime("application/pdf");
        assert!(source.is_allowed(&Settings::default()));
    }

    #[test]
    fn test_images_have_no_decoder() {
        let registry = DecoderRegistry::new();
        let err = registry
            .decode(&DocumentSource::new("photo.png", vec![0x89, b'P', b'N', b'G']))
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFileKind { kind } if kind == "png"));
        assert!(!registry.supports(FileKind::Jpeg));
        assert!(!registry.supports(FileKind::Word));
    }

    #[test]
    fn test_unknown_kind() {
        let err = DecoderRegistry::new()
            .decode(&DocumentSource::new("archive.tar", vec![]))
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFileKind { kind } if kind == "tar"));
    }

    #[test]
    fn test_empty_registry_decodes_nothing() {
        let registry = DecoderRegistry::empty();
        assert!(registry.decode(&DocumentSource::new("a.txt", b"hi".to_vec())).is_err());

        let registry = registry.with_decoder(PlainTextDecoder);
        assert_eq!(
            registry.decode(&DocumentSource::new("a.txt", b"hi".to_vec())).unwrap(),
            "hi"
        );
    }
}
