//! File creation tool: writes generated documents into a drop directory.
//!
//! File names are restricted to a single path component and an extension
//! allow-list, so the reasoning model cannot write outside the configured
//! directory.

use std::path::PathBuf;

use async_trait::async_trait;

use windlass_core::error::ToolError;
use windlass_core::tool::{ArgKind, Tool, ToolOutcome, ToolRequest, ToolSchema};

pub struct CreateFileTool {
    drop_dir: PathBuf,
    allowed_extensions: Vec<String>,
}

impl CreateFileTool {
    pub fn new(drop_dir: impl Into<PathBuf>, allowed_extensions: Vec<String>) -> Self {
        Self {
            drop_dir: drop_dir.into(),
            allowed_extensions,
        }
    }

    fn check_file_name(&self, file_name: &str) -> Result<(), String> {
        if file_name.contains('/') || file_name.contains('\\') || file_name.contains("..") {
            return Err(format!(
                "file_name must be a bare name without path separators, got '{file_name}'"
            ));
        }

        let extension = file_name.rsplit_once('.').map(|(_, ext)| ext);
        match extension {
            None => Err(format!("file_name '{file_name}' has no extension")),
            Some(ext) => {
                if self
                    .allowed_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
                {
                    Ok(())
                } else {
                    Err(format!(
                        "extension '{ext}' is not allowed (allowed: {})",
                        self.allowed_extensions.join(", ")
                    ))
                }
            }
        }
    }
}

impl Default for CreateFileTool {
    fn default() -> Self {
        Self::new(
            "./drop",
            vec!["txt".into(), "md".into(), "csv".into(), "json".into()],
        )
    }
}

#[async_trait]
impl Tool for CreateFileTool {
    fn name(&self) -> &str {
        "create_file"
    }

    fn description(&self) -> &str {
        "Create a text file with the given name and content in the shared drop directory."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new()
            .required("file_name", ArgKind::String, "Name of the file, with extension")
            .required("content", ArgKind::String, "Text content to write")
    }

    async fn execute(&self, request: &ToolRequest) -> Result<ToolOutcome, ToolError> {
        let file_name = request
            .arguments
            .get("file_name")
            .cloned()
            .unwrap_or_default();
        let content = request
            .arguments
            .get("content")
            .cloned()
            .unwrap_or_default();

        if let Err(reason) = self.check_file_name(&file_name) {
            return Ok(ToolOutcome::failed(reason));
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.drop_dir).await {
            return Ok(ToolOutcome::failed(format!(
                "Could not create drop directory {}: {e}",
                self.drop_dir.display()
            )));
        }

        let path = self.drop_dir.join(&file_name);
        match tokio::fs::write(&path, content.as_bytes()).await {
            Ok(()) => Ok(ToolOutcome::ok(serde_json::json!({
                "file_name": file_name,
                "path": path.display().to_string(),
                "bytes": content.len(),
            }))),
            Err(e) => Ok(ToolOutcome::failed(format!(
                "Failed to write {}: {e}",
                path.display()
            ))),
        }
    }
}
