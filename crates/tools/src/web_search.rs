//! Web search tool: a stub that returns deterministic search results.
//!
//! In production this would call a real search API. The stub returns
//! plausible results so the research loop can be exercised end-to-end
//! without network access, which is also what the test scenarios rely on.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use windlass_core::error::ToolError;
use windlass_core::tool::{ArgKind, Tool, ToolOutcome, ToolRequest, ToolSchema};

pub struct WebSearchTool {
    max_results: usize,
}

impl WebSearchTool {
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new(5)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information. Returns a list of relevant results with titles, URLs, and snippets."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new()
            .required("query", ArgKind::String, "The search query")
            .optional(
                "num_results",
                ArgKind::Integer,
                "Number of results to return (default 3)",
            )
    }

    async fn execute(&self, request: &ToolRequest) -> Result<ToolOutcome, ToolError> {
        // Schema validation guarantees a non-empty query.
        let query = request
            .arguments
            .get("query")
            .cloned()
            .unwrap_or_default();

        let num_results = match request.arguments.get("num_results") {
            None => 3,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) => n.min(self.max_results),
                Err(_) => {
                    return Ok(ToolOutcome::failed(format!(
                        "num_results must be a number, got '{raw}'"
                    )));
                }
            },
        };

        debug!(query = %query, num_results, "Running web search");
        let results = generate_results(&query, num_results);
        Ok(ToolOutcome::ok(serde_json::json!({
            "query": query,
            "results": results,
        })))
    }
}

#[derive(Clone, Serialize)]
struct SearchResult {
    title: String,
    url: String,
    snippet: String,
}

fn generate_results(query: &str, count: usize) -> Vec<SearchResult> {
    let q = query.to_lowercase();

    // Context-aware canned results for the domains the workflow routes.
    let templates: Vec<(&str, Vec<SearchResult>)> = vec![
        ("tax", vec![
            SearchResult {
                title: "Small Business Tax Obligations Overview".into(),
                url: "https://taxguide.example.com/small-business".into(),
                snippet: "Filing deadlines, deductible expense categories, and estimated payment schedules for small businesses.".into(),
            },
            SearchResult {
                title: "Quarterly Estimated Taxes Explained".into(),
                url: "https://taxguide.example.com/quarterly".into(),
                snippet: "Who must pay quarterly estimates, how the safe-harbor rules work, and common penalty triggers.".into(),
            },
        ]),
        ("contract", vec![
            SearchResult {
                title: "Essential Clauses for Service Contracts".into(),
                url: "https://lawdesk.example.com/service-contracts".into(),
                snippet: "Scope, payment terms, liability caps, and termination clauses every service agreement should carry.".into(),
            },
            SearchResult {
                title: "Contract Review Checklist".into(),
                url: "https://lawdesk.example.com/review-checklist".into(),
                snippet: "A practical checklist for reviewing commercial contracts before signature.".into(),
            },
        ]),
        ("marketing", vec![
            SearchResult {
                title: "Customer Acquisition Channels Compared".into(),
                url: "https://growthnotes.example.com/channels".into(),
                snippet: "Paid search, content, referral, and outbound channels compared by cost per acquisition.".into(),
            },
            SearchResult {
                title: "Positioning for Niche Products".into(),
                url: "https://growthnotes.example.com/positioning".into(),
                snippet: "How narrow positioning shortens sales cycles for specialized products.".into(),
            },
        ]),
    ];

    for (keyword, results) in &templates {
        if q.contains(keyword) {
            return results.iter().take(count).cloned().collect();
        }
    }

    // Generic results derived from the query itself.
    (1..=count)
        .map(|i| SearchResult {
            title: format!("Result {i} for \"{query}\""),
            url: format!(
                "https://search.example.com/{}/{i}",
                query.replace(' ', "-").to_lowercase()
            ),
            snippet: format!("Reference material {i} discussing {query}."),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_definition() {
        let tool = WebSearchTool::default();
        assert_eq!(tool.name(), "web_search");
        let schema = tool.schema().to_json();
        assert_eq!(schema["required"], serde_json::json!(["query"]));
        assert!(schema["properties"]["num_results"].is_object());
    }

    #[tokio::test]
    async fn returns_results_for_query() {
        let tool = WebSearchTool::default();
        let request = ToolRequest::new("web_search", "look up tax rules")
            .with_arg("query", "small business tax deadlines");

        let outcome = tool.execute(&request).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.data["query"], "small business tax deadlines");
        let results = outcome.data["results"].as_array().unwrap();
        assert!(!results.is_empty());
        assert!(results[0]["title"].is_string());
        assert!(results[0]["url"].is_string());
        assert!(results[0]["snippet"].is_string());
    }

    #[tokio::test]
    async fn generic_results_for_unknown_topic() {
        let tool = WebSearchTool::default();
        let request = ToolRequest::new("web_search", "")
            .with_arg("query", "regional llama husbandry")
            .with_arg("num_results", "2");

        let outcome = tool.execute(&request).await.unwrap();
        let results = outcome.data["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert!(
            results[0]["title"]
                .as_str()
                .unwrap()
                .contains("regional llama husbandry")
        );
    }

    #[tokio::test]
    async fn malformed_num_results_is_expected_failure() {
        let tool = WebSearchTool::default();
        let request = ToolRequest::new("web_search", "")
            .with_arg("query", "anything")
            .with_arg("num_results", "lots");

        let outcome = tool.execute(&request).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("num_results"));
    }

    #[tokio::test]
    async fn result_count_is_capped() {
        let tool = WebSearchTool::new(2);
        let request = ToolRequest::new("web_search", "")
            .with_arg("query", "anything at all")
            .with_arg("num_results", "50");

        let outcome = tool.execute(&request).await.unwrap();
        assert_eq!(outcome.data["results"].as_array().unwrap().len(), 2);
    }
}
