//! Built-in tool implementations for windlass.
//!
//! Tools give the research loop the ability to gather material: search
//! the web, download attached documents, and emit generated files. The
//! registry is assembled once at startup and shared read-only.

pub mod create_file;
pub mod fetch_file;
pub mod web_search;

use std::sync::Arc;

use windlass_config::ToolsConfig;
use windlass_core::tool::ToolRegistry;

pub use create_file::CreateFileTool;
pub use fetch_file::FetchFileTool;
pub use web_search::WebSearchTool;

/// Create the default tool registry from configuration.
pub fn default_registry(config: &ToolsConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WebSearchTool::new(config.search_results)));
    registry.register(Arc::new(FetchFileTool::new(config.fetch_max_bytes)));
    registry.register(Arc::new(CreateFileTool::new(
        config.drop_dir.clone(),
        config.allowed_extensions.clone(),
    )));
    registry
}
