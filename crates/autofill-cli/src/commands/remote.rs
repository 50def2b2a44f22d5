//! Delegates decoding and extraction to an external process server.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use autofill_core::{validate_source, AutofillConfig, DecodeError, DocumentSource, FormData, ProcessResponse};

/// Reply of `POST /process`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    form_data: Option<Map<String, Value>>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for a remote `/process` endpoint.
pub struct RemoteProcessor {
    client: reqwest::Client,
    url: String,
}

impl RemoteProcessor {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("autofill-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Endpoint files are uploaded to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Validate locally, then upload the file. Every failure is reported in
    /// the response.
    pub async fn process(&self, config: &AutofillConfig, source: &DocumentSource) -> ProcessResponse {
        info!("Processing {} via {}", source.name, self.url);

        let result = match validate_source(config, source) {
            Ok(()) => self.upload(source).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(data) => ProcessResponse::succeeded(&source.name, data),
            Err(e) => {
                warn!("Failed to process {}: {}", source.name, e);
                ProcessResponse::failed(&source.name, e)
            }
        }
    }

    async fn upload(&self, source: &DocumentSource) -> Result<FormData, DecodeError> {
        let mut part = Part::bytes(source.bytes.clone()).file_name(source.name.clone());
        if let Some(mime) = &source.mime {
            part = part.mime_str(mime).map_err(failure)?;
        }
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(failure)?;

        let status = response.status();
        debug!("Server replied {} for {}", status, source.name);

        let reply: ServerReply = response.json().await.map_err(|e| {
            if status.is_success() {
                failure(e)
            } else {
                DecodeError::DecodeFailure(format!("server returned {}", status))
            }
        })?;

        if !status.is_success() || !reply.success {
            let error = reply
                .error
                .unwrap_or_else(|| format!("server returned {}", status));
            return Err(DecodeError::DecodeFailure(error));
        }

        Ok(reply.form_data.map(form_data_from_json).unwrap_or_default())
    }
}

fn failure(e: impl std::fmt::Display) -> DecodeError {
    DecodeError::DecodeFailure(e.to_string())
}

/// Keep string values, stringify scalars, drop nulls and nested values.
fn form_data_from_json(map: Map<String, Value>) -> FormData {
    map.into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => return None,
            };
            Some((key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reply_values_are_normalized() {
        let reply: ServerReply = serde_json::from_str(
            r#"{
                "success": true,
                "formData": {"email": "a@b.com", "phone": null, "amount": 42.5, "flag": true, "list": [1], "name": ""}
            }"#,
        )
        .unwrap();

        let data = form_data_from_json(reply.form_data.unwrap());
        assert_eq!(data.len(), 3);
        assert_eq!(data.get("email"), Some("a@b.com"));
        assert_eq!(data.get("amount"), Some("42.5"));
        assert_eq!(data.get("flag"), Some("true"));
        assert!(!data.contains_key("phone"));
    }

    #[test]
    fn test_error_reply() {
        let reply: ServerReply =
            serde_json::from_str(r#"{"success": false, "error": "Unsupported file type"}"#).unwrap();
        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some("Unsupported file type"));
        assert!(reply.form_data.is_none());
    }

    #[tokio::test]
    async fn test_disallowed_file_is_not_uploaded() {
        // Nothing listens here; validation must fail before any request.
        let remote = RemoteProcessor::new("http://127.0.0.1:9/process").unwrap();
        let source = DocumentSource::new("tool.exe", b"MZ".to_vec());

        let response = remote.process(&AutofillConfig::default(), &source).await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("unsupported file type: exe"));
    }
}
