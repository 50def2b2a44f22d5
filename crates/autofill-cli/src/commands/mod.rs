//! Subcommands and the helpers they share.

pub mod config;
pub mod extract;
pub mod fields;
pub mod fill;
mod remote;

use std::path::{Path, PathBuf};

use glob::glob;
use tracing::{debug, warn};

use autofill_core::{process_file, AutofillConfig, DecoderRegistry, DocumentSource, ProcessResponse};

pub use remote::RemoteProcessor;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("autofill")
        .join("config.json")
}

/// Configuration file in use: `--config` if given, else the default path.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load configuration. An explicit path must exist; a missing default
/// file means defaults.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<AutofillConfig> {
    let path = config_path(explicit);
    if explicit.is_some() || path.exists() {
        debug!("Loading configuration from {}", path.display());
        Ok(AutofillConfig::from_file(&path)?)
    } else {
        Ok(AutofillConfig::default())
    }
}

/// Expand file arguments: glob patterns are expanded, plain paths are kept.
pub fn expand_inputs(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if Path::new(input).exists() {
            files.push(PathBuf::from(input));
            continue;
        }

        let matched: Vec<PathBuf> = glob(input)?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matched.is_empty() {
            anyhow::bail!("No matching files found for: {}", input);
        }
        files.extend(matched);
    }
    Ok(files)
}

/// Remote processor for `--server URL`, or for `--remote` using the
/// configured `decode.serverUrl`.
pub fn remote_processor(
    server: Option<&str>,
    use_config: bool,
    config: &AutofillConfig,
) -> anyhow::Result<Option<RemoteProcessor>> {
    let url = match server {
        Some(url) => url,
        None if use_config => config.decode.server_url.as_str(),
        None => return Ok(None),
    };
    if url.trim().is_empty() {
        anyhow::bail!("No process server configured. Set decode.serverUrl or pass --server.");
    }
    debug!("Using process server {}", url);
    RemoteProcessor::new(url).map(Some)
}

/// Process one file locally or through the remote server. A file that
/// cannot be read is reported in its response like any other failure.
pub async fn process(
    config: &AutofillConfig,
    registry: &DecoderRegistry,
    remote: Option<&RemoteProcessor>,
    path: &Path,
) -> ProcessResponse {
    let source = match DocumentSource::from_path(path) {
        Ok(source) => source,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            return ProcessResponse::failed(name, e);
        }
    };

    match remote {
        Some(remote) => remote.process(config, &source).await,
        None => process_file(config, registry, &source),
    }
}
