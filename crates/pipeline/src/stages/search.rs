//! Web search fallback.

use crate::boundary::bounded;
use crate::graph::StageOutput;
use crate::state::{Document, StateUpdate, WorkflowState};
use crate::web_search::{Snippet, WebSearch};
use std::sync::Arc;
use std::time::Duration;

pub struct WebSearchStage {
    search: Arc<dyn WebSearch>,
    max_results: usize,
    timeout: Duration,
}

impl WebSearchStage {
    pub fn new(search: Arc<dyn WebSearch>, max_results: usize, timeout: Duration) -> Self {
        Self {
            search,
            max_results,
            timeout,
        }
    }

    /// Replace the documents with one built from the search results.
    ///
    /// A failed search, or one with no usable snippet, leaves an empty list.
    pub async fn run(&self, state: &WorkflowState) -> StageOutput {
        let result = bounded(
            "web search",
            self.timeout,
            self.search.search(&state.question, self.max_results),
        )
        .await;

        let documents = match result {
            Ok(snippets) => {
                tracing::info!(results = snippets.len(), "Web search finished");
                merge_snippets(&snippets).into_iter().collect()
            }
            Err(e) => {
                tracing::warn!("Web search failed, continuing without web context: {}", e);
                Vec::new()
            }
        };

        StageOutput::next(StateUpdate::new().documents(documents))
    }
}

/// Newline-join the non-empty snippet contents into a single document.
fn merge_snippets(snippets: &[Snippet]) -> Option<Document> {
    let joined = snippets
        .iter()
        .map(|s| s.content.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if joined.is_empty() {
        None
    } else {
        Some(Document::new(joined))
    }
}
