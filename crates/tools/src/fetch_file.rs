//! File fetch tool: retrieves an attached document over HTTP.
//!
//! Attachments arrive as presigned URLs; the tool downloads the body as
//! text and caps it so one oversized document cannot flood the evidence
//! pool. Unreachable hosts and error statuses are expected failures, not
//! workflow-fatal errors.

use async_trait::async_trait;
use tracing::{debug, warn};

use windlass_core::error::ToolError;
use windlass_core::tool::{ArgKind, Tool, ToolOutcome, ToolRequest, ToolSchema};

pub struct FetchFileTool {
    client: reqwest::Client,
    max_bytes: usize,
}

impl FetchFileTool {
    pub fn new(max_bytes: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, max_bytes }
    }
}

impl Default for FetchFileTool {
    fn default() -> Self {
        Self::new(262_144)
    }
}

#[async_trait]
impl Tool for FetchFileTool {
    fn name(&self) -> &str {
        "fetch_file"
    }

    fn description(&self) -> &str {
        "Download the text content of a file the user attached, given its URL."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().required("file_url", ArgKind::String, "URL of the file to download")
    }

    async fn execute(&self, request: &ToolRequest) -> Result<ToolOutcome, ToolError> {
        let file_url = request
            .arguments
            .get("file_url")
            .cloned()
            .unwrap_or_default();

        if !file_url.starts_with("http://") && !file_url.starts_with("https://") {
            return Err(ToolError::InvalidArguments(
                "file_url must start with http:// or https://".into(),
            ));
        }

        debug!(file_url = %file_url, "Fetching attachment");
        let response = match self.client.get(&file_url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(file_url = %file_url, error = %e, "Fetch failed");
                return Ok(ToolOutcome::failed(format!(
                    "Failed to fetch {file_url}: {e}"
                )));
            }
        };

        let status = response.status().as_u16();
        if status != 200 {
            warn!(file_url = %file_url, status, "Fetch returned error status");
            return Ok(ToolOutcome::failed(format!(
                "Fetch of {file_url} returned status {status}"
            )));
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                return Ok(ToolOutcome::failed(format!(
                    "Failed to read body of {file_url}: {e}"
                )));
            }
        };

        let truncated = body.len() > self.max_bytes;
        let content = if truncated {
            let mut end = self.max_bytes;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body[..end].to_string()
        } else {
            body
        };

        Ok(ToolOutcome::ok(serde_json::json!({
            "file_url": file_url,
            "content": content,
            "truncated": truncated,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_definition() {
        let tool = FetchFileTool::default();
        assert_eq!(tool.name(), "fetch_file");
        let schema = tool.schema().to_json();
        assert_eq!(schema["required"], serde_json::json!(["file_url"]));
    }

    #[tokio::test]
    async fn non_http_url_is_rejected() {
        let tool = FetchFileTool::default();
        let request =
            ToolRequest::new("fetch_file", "").with_arg("file_url", "ftp://host/file.txt");

        let err = tool.execute(&request).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_expected_failure() {
        let tool = FetchFileTool::default();
        // Reserved TLD guarantees resolution failure without network access.
        let request = ToolRequest::new("fetch_file", "")
            .with_arg("file_url", "http://unreachable.invalid/doc.txt");

        let outcome = tool.execute(&request).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("unreachable.invalid"));
    }
}
