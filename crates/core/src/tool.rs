//! Tool abstraction and the process-wide registry.
//!
//! Tools are registered once at startup and the registry is read-only
//! afterwards, so concurrent workflows can share it behind an `Arc`
//! without locking. Argument validation happens before execution and
//! reports the offending field by name.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ToolError, ValidationError};

/// Declared type of a tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl ArgKind {
    fn json_type(&self) -> &'static str {
        match self {
            ArgKind::String => "string",
            ArgKind::Integer => "integer",
            ArgKind::Number => "number",
            ArgKind::Boolean => "boolean",
        }
    }
}

/// One declared argument of a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgSpec {
    pub name: String,
    pub kind: ArgKind,
    pub description: String,
    pub required: bool,
}

/// The argument contract a tool declares.
///
/// Renders to a JSON-Schema object for prompt/tool definitions and
/// validates incoming argument maps. Arguments arrive normalized to
/// strings; `kind` documents the intended interpretation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolSchema {
    pub args: Vec<ArgSpec>,

    /// When false (the default), arguments not declared here are rejected.
    pub additional_properties: bool,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(
        mut self,
        name: impl Into<String>,
        kind: ArgKind,
        description: impl Into<String>,
    ) -> Self {
        self.args.push(ArgSpec {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
        });
        self
    }

    pub fn optional(
        mut self,
        name: impl Into<String>,
        kind: ArgKind,
        description: impl Into<String>,
    ) -> Self {
        self.args.push(ArgSpec {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
        });
        self
    }

    /// Accept arguments beyond the declared set.
    pub fn open(mut self) -> Self {
        self.additional_properties = true;
        self
    }

    /// Check an argument map against this schema.
    ///
    /// Missing required arguments, empty-string values for required
    /// arguments, and undeclared arguments (when the schema is closed) are
    /// each fatal, reported with the offending field name.
    pub fn validate(
        &self,
        tool_name: &str,
        arguments: &BTreeMap<String, String>,
    ) -> Result<(), ValidationError> {
        for spec in self.args.iter().filter(|a| a.required) {
            match arguments.get(&spec.name) {
                None => {
                    return Err(ValidationError::MissingArgument {
                        tool_name: tool_name.into(),
                        field: spec.name.clone(),
                    });
                }
                Some(value) if value.is_empty() => {
                    return Err(ValidationError::EmptyArgument {
                        tool_name: tool_name.into(),
                        field: spec.name.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        if !self.additional_properties {
            for key in arguments.keys() {
                if !self.args.iter().any(|a| &a.name == key) {
                    return Err(ValidationError::UnexpectedArgument {
                        tool_name: tool_name.into(),
                        field: key.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// JSON-Schema rendering used in tool definitions shown to the model.
    pub fn to_json(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for spec in &self.args {
            properties.insert(
                spec.name.clone(),
                serde_json::json!({
                    "type": spec.kind.json_type(),
                    "description": spec.description,
                }),
            );
            if spec.required {
                required.push(serde_json::Value::String(spec.name.clone()));
            }
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": self.additional_properties,
        })
    }
}

/// A tool invocation proposed by the reasoning step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub tool_name: String,

    /// The reasoning step's free-text intent for this call
    pub input_text: String,

    /// Arguments, normalized to strings before validation
    #[serde(default)]
    pub arguments: BTreeMap<String, String>,

    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ToolRequest {
    pub fn new(tool_name: impl Into<String>, input_text: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            input_text: input_text.into(),
            arguments: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    pub fn with_meta(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(name.into(), value);
        self
    }
}

/// What a tool execution produced.
///
/// Expected failures (unreachable host, empty result set) are unsuccessful
/// outcomes, not errors; the workflow keeps going and the reasoning step
/// sees what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,

    /// Tool-specific payload; introspected downstream only for known tools
    pub data: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolOutcome {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: serde_json::Value::Null,
            error: Some(error.into()),
        }
    }
}

/// The contract every registered tool implements.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique registry key.
    fn name(&self) -> &str;

    /// One-line description shown to the reasoning model.
    fn description(&self) -> &str;

    /// Declared argument contract.
    fn schema(&self) -> ToolSchema;

    /// Run the tool. Arguments have already passed schema validation.
    async fn execute(&self, request: &ToolRequest) -> Result<ToolOutcome, ToolError>;

    /// Full definition (name + description + parameters) for prompts.
    fn definition(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name(),
            "description": self.description(),
            "parameters": self.schema().to_json(),
        })
    }
}

/// Registry of available tools, keyed by unique name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Re-registration under an existing name replaces
    /// the prior binding.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool_name = %name, "Replacing previously registered tool");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Definitions of every registered tool, sorted by name for stable
    /// prompt rendering.
    pub fn definitions(&self) -> Vec<serde_json::Value> {
        let mut entries: Vec<_> = self.tools.values().collect();
        entries.sort_by_key(|t| t.name().to_string());
        entries.iter().map(|t| t.definition()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
