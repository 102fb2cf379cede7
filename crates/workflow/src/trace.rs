//! Research trace: the append-only turn history and the deduplicated
//! evidence pool that the synthesis prompt is built from.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use windlass_core::tool::{ToolOutcome, ToolRequest};

// --- Turns ---

/// One iteration of the reasoning loop: what the model thought, what it
/// asked for, and what came back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// The model's stated reasoning for this step.
    pub reasoning_summary: String,
    /// The tool invocation requested this turn, if any. A finalize decision
    /// opens a turn with no request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<ToolRequest>,
    /// Outcome attached once the tool call completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<ToolOutcome>,
}

/// Append-only record of reasoning turns for one workflow run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnHistory {
    turns: Vec<Turn>,
}

impl TurnHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new turn. Earlier turns are never mutated except to receive
    /// their observation.
    pub fn open(&mut self, reasoning_summary: impl Into<String>, request: Option<ToolRequest>) {
        self.turns.push(Turn {
            reasoning_summary: reasoning_summary.into(),
            request,
            observation: None,
        });
    }

    /// Attach an outcome to the most recently opened turn. Returns false when
    /// there is no open turn or it already holds an observation.
    pub fn attach_observation(&mut self, outcome: ToolOutcome) -> bool {
        match self.turns.last_mut() {
            Some(turn) if turn.observation.is_none() => {
                turn.observation = Some(outcome);
                true
            }
            _ => false,
        }
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of turns that actually invoked a tool.
    pub fn tool_call_count(&self) -> usize {
        self.turns.iter().filter(|t| t.request.is_some()).count()
    }
}

// --- Evidence ---

/// A single unit of research material with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    /// Tool that produced this item.
    pub tool_name: String,
    /// Human-readable text cited in the final answer.
    pub summary: String,
    /// Raw provenance payload (URL, file name, result object).
    pub source: serde_json::Value,
}

impl Evidence {
    pub fn new(
        tool_name: impl Into<String>,
        summary: impl Into<String>,
        source: serde_json::Value,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            summary: summary.into(),
            source,
        }
    }
}

/// Ordered, deduplicated collection of evidence.
///
/// Insertion order is preserved so citation numbers stay stable; an item
/// whose summary text exactly matches an earlier one is dropped.
#[derive(Debug, Clone, Default)]
pub struct EvidencePool {
    items: Vec<Evidence>,
    seen: HashSet<String>,
}

impl EvidencePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item unless its summary duplicates an existing one.
    /// Returns whether the item was kept.
    pub fn push(&mut self, evidence: Evidence) -> bool {
        if self.seen.contains(&evidence.summary) {
            return false;
        }
        self.seen.insert(evidence.summary.clone());
        self.items.push(evidence);
        true
    }

    pub fn items(&self) -> &[Evidence] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn observation_attaches_to_last_open_turn() {
        let mut turns = TurnHistory::new();
        assert!(!turns.attach_observation(ToolOutcome::ok(json!({}))));

        turns.open("look up rates", Some(ToolRequest::new("web_search", "rates")));
        assert!(turns.attach_observation(ToolOutcome::ok(json!({"hits": 3}))));
        // Second attach to the same turn is refused.
        assert!(!turns.attach_observation(ToolOutcome::ok(json!({}))));

        turns.open("enough material", None);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns.tool_call_count(), 1);
        assert!(turns.last().unwrap().observation.is_none());
    }

    #[test]
    fn evidence_dedups_on_exact_summary_and_keeps_order() {
        let mut pool = EvidencePool::new();
        assert!(pool.push(Evidence::new("web_search", "VAT is 20%", json!({"url": "a"}))));
        assert!(pool.push(Evidence::new("web_search", "Returns due in April", json!({"url": "b"}))));
        // Same text from a different source is still a duplicate.
        assert!(!pool.push(Evidence::new("fetch_file", "VAT is 20%", json!({"url": "c"}))));

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.items()[0].summary, "VAT is 20%");
        assert_eq!(pool.items()[1].summary, "Returns due in April");
    }

    #[test]
    fn near_duplicate_summaries_are_kept() {
        let mut pool = EvidencePool::new();
        pool.push(Evidence::new("web_search", "VAT is 20%", json!({})));
        assert!(pool.push(Evidence::new("web_search", "VAT is 20% ", json!({}))));
        assert_eq!(pool.len(), 2);
    }
}
