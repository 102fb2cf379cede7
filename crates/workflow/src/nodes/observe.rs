//! Observe: fold the raw tool outcome into evidence.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use windlass_core::error::{Error, Result};
use windlass_core::tool::{ToolOutcome, ToolRequest};

use crate::graph::{Next, Node};
use crate::state::WorkflowState;
use crate::trace::Evidence;

const SUMMARY_CAP: usize = 2_000;

/// Consumes the pending request and its outcome, appends evidence, and
/// counts the completed iteration.
///
/// Known tools get per-shape folding; anything else becomes a generic note
/// so no observation is ever dropped on the floor.
#[derive(Default)]
pub struct ObserveNode;

impl ObserveNode {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Node<WorkflowState> for ObserveNode {
    fn id(&self) -> &str {
        super::OBSERVE
    }

    async fn run(&self, mut state: WorkflowState) -> Result<(WorkflowState, Next)> {
        let request = state
            .pending_request
            .take()
            .ok_or_else(|| Error::Internal("observe node ran without a pending request".into()))?;
        let outcome = state
            .last_outcome
            .take()
            .ok_or_else(|| Error::Internal("observe node ran without a tool outcome".into()))?;

        let mut kept = 0usize;
        for item in fold_outcome(&request, &outcome) {
            if state.evidence.push(item) {
                kept += 1;
            }
        }
        state.loop_count += 1;
        debug!(
            chat_id = %state.chat_id,
            tool = %request.tool_name,
            kept,
            iteration = state.loop_count,
            "observation folded into evidence"
        );

        Ok((state, Next::Continue))
    }
}

/// Turn one tool outcome into evidence items.
fn fold_outcome(request: &ToolRequest, outcome: &ToolOutcome) -> Vec<Evidence> {
    if !outcome.success {
        let detail = outcome.error.as_deref().unwrap_or("no detail");
        return vec![Evidence::new(
            &request.tool_name,
            format!("Attempt to use {} failed: {detail}", request.tool_name),
            json!({ "error": detail }),
        )];
    }

    match request.tool_name.as_str() {
        "web_search" => fold_search(request, outcome),
        "fetch_file" => fold_fetch(request, outcome),
        "create_file" => fold_create(request, outcome),
        other => vec![Evidence::new(
            other,
            format!("{other} returned: {}", clip(&outcome.data.to_string())),
            outcome.data.clone(),
        )],
    }
}

/// One evidence item per search result, in result order.
fn fold_search(request: &ToolRequest, outcome: &ToolOutcome) -> Vec<Evidence> {
    let results = outcome
        .data
        .get("results")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    if results.is_empty() {
        return vec![Evidence::new(
            &request.tool_name,
            format!(
                "Search for \"{}\" returned no results",
                request
                    .arguments
                    .get("query")
                    .map(String::as_str)
                    .unwrap_or("")
            ),
            outcome.data.clone(),
        )];
    }

    results
        .iter()
        .map(|result| {
            let title = result.get("title").and_then(|v| v.as_str()).unwrap_or("Untitled");
            let snippet = result.get("snippet").and_then(|v| v.as_str()).unwrap_or("");
            Evidence::new(
                &request.tool_name,
                clip(&format!("{title}: {snippet}")),
                result.clone(),
            )
        })
        .collect()
}

/// File content collapses into a single item with its source URL.
fn fold_fetch(request: &ToolRequest, outcome: &ToolOutcome) -> Vec<Evidence> {
    let content = outcome
        .data
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let file_url = outcome
        .data
        .get("file_url")
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    vec![Evidence::new(
        &request.tool_name,
        clip(content),
        json!({ "file_url": file_url }),
    )]
}

fn fold_create(request: &ToolRequest, outcome: &ToolOutcome) -> Vec<Evidence> {
    let name = outcome
        .data
        .get("file_name")
        .and_then(|v| v.as_str())
        .unwrap_or("file");
    let bytes = outcome.data.get("bytes").and_then(|v| v.as_u64()).unwrap_or(0);
    vec![Evidence::new(
        &request.tool_name,
        format!("Created file {name} ({bytes} bytes)"),
        outcome.data.clone(),
    )]
}

fn clip(text: &str) -> String {
    if text.len() <= SUMMARY_CAP {
        return text.to_string();
    }
    let mut end = SUMMARY_CAP;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::state_with_user;

    fn observed(request: ToolRequest, outcome: ToolOutcome) -> WorkflowState {
        let mut state = state_with_user("research this");
        state.pending_request = Some(request);
        state.last_outcome = Some(outcome);
        state
    }

    #[tokio::test]
    async fn search_results_fold_in_order() {
        let request = ToolRequest::new("web_search", "rates").with_arg("query", "vat rates");
        let outcome = ToolOutcome::ok(json!({
            "results": [
                {"title": "HMRC guidance", "snippet": "Standard rate is 20%", "url": "https://a"},
                {"title": "Reduced rates", "snippet": "Some goods are 5%", "url": "https://b"},
            ]
        }));

        let (state, next) = ObserveNode::new()
            .run(observed(request, outcome))
            .await
            .unwrap();

        assert_eq!(next, Next::Continue);
        assert_eq!(state.loop_count, 1);
        assert_eq!(state.evidence.len(), 2);
        assert!(state.evidence.items()[0].summary.starts_with("HMRC guidance"));
        assert!(state.evidence.items()[1].summary.starts_with("Reduced rates"));
        assert!(state.pending_request.is_none());
        assert!(state.last_outcome.is_none());
    }

    #[tokio::test]
    async fn fetched_file_folds_to_one_item() {
        let request = ToolRequest::new("fetch_file", "read the contract")
            .with_arg("file_url", "https://example.com/contract.txt");
        let outcome = ToolOutcome::ok(json!({
            "file_url": "https://example.com/contract.txt",
            "content": "Clause 4: either party may terminate with 30 days notice.",
            "truncated": false
        }));

        let (state, _) = ObserveNode::new()
            .run(observed(request, outcome))
            .await
            .unwrap();

        assert_eq!(state.evidence.len(), 1);
        assert!(state.evidence.items()[0].summary.contains("Clause 4"));
    }

    #[tokio::test]
    async fn unknown_tool_output_becomes_a_generic_note() {
        let request = ToolRequest::new("currency_convert", "convert");
        let outcome = ToolOutcome::ok(json!({"amount": 120.5, "currency": "EUR"}));

        let (state, _) = ObserveNode::new()
            .run(observed(request, outcome))
            .await
            .unwrap();

        assert_eq!(state.evidence.len(), 1);
        let summary = &state.evidence.items()[0].summary;
        assert!(summary.contains("currency_convert"));
        assert!(summary.contains("EUR"));
    }

    #[tokio::test]
    async fn failed_outcome_is_recorded_as_a_failure_note() {
        let request = ToolRequest::new("web_search", "rates").with_arg("query", "rates");
        let outcome = ToolOutcome::failed("network unreachable");

        let (state, _) = ObserveNode::new()
            .run(observed(request, outcome))
            .await
            .unwrap();

        assert_eq!(state.loop_count, 1);
        assert_eq!(state.evidence.len(), 1);
        assert!(state.evidence.items()[0].summary.contains("network unreachable"));
    }

    #[tokio::test]
    async fn duplicate_summaries_are_not_double_counted() {
        let request = ToolRequest::new("web_search", "rates").with_arg("query", "vat");
        let outcome = ToolOutcome::ok(json!({
            "results": [
                {"title": "Same", "snippet": "text", "url": "https://a"},
                {"title": "Same", "snippet": "text", "url": "https://b"},
            ]
        }));

        let (state, _) = ObserveNode::new()
            .run(observed(request, outcome))
            .await
            .unwrap();
        assert_eq!(state.evidence.len(), 1);
    }
}
