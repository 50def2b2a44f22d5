//! Configuration structures for the autofill pipeline.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::form_data::Category;
use crate::error::Result;

/// Main configuration for the autofill pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutofillConfig {
    /// User-facing settings (the persisted settings surface).
    pub settings: Settings,

    /// Entity extraction configuration.
    pub extraction: ExtractionConfig,

    /// Decoder configuration.
    pub decode: DecodeConfig,
}

/// Flat user settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Master on/off switch. A disabled session never writes to fields.
    pub enabled: bool,

    /// Re-scan automatically when candidate fields are added to the page.
    pub auto_detect: bool,

    /// Allow-list of file extensions or MIME kinds accepted for processing.
    pub supported_file_types: BTreeSet<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_detect: true,
            supported_file_types: ["pdf", "jpg", "jpeg", "png", "doc", "docx", "txt", "md"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Settings {
    /// Check an extension or MIME kind against the allow-list, case-insensitively.
    pub fn allows(&self, kind: &str) -> bool {
        let kind = kind.trim().trim_start_matches('.');
        !kind.is_empty()
            && self
                .supported_file_types
                .iter()
                .any(|t| t.trim_start_matches('.').eq_ignore_ascii_case(kind))
    }
}

/// Entity extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractionConfig {
    /// Categories to recognize. They always run in priority order.
    pub categories: Vec<Category>,

    /// Keep the decoded text in processing responses.
    pub include_text: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            categories: Category::ALL.to_vec(),
            include_text: true,
        }
    }
}

/// Decoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecodeConfig {
    /// Maximum accepted file size in bytes.
    pub max_file_size: u64,

    /// Endpoint of the external process server used for remote decoding.
    pub server_url: String,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            server_url: "http://127.0.0.1:5000/process".to_string(),
        }
    }
}

impl AutofillConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
