//! Workflow graph: node identities and the transition table.
//!
//! ```text
//! classify ──related──▶ retrieve ─▶ grade ──needs web──▶ rewrite ─▶ web_search ─┐
//!    │                     │          │                                         ▼
//!    └──────other──────────┼──────────┴──────────relevant docs──────────────▶ generate ─▶ done
//!                          └──unreachable──────────────────────────────────────────────▶ done
//! ```

use crate::state::{QueryType, StateUpdate, WebSearchNeeded, WorkflowState};
use serde::Serialize;

/// Longest possible path through the graph, `done` excluded.
pub const MAX_STEPS: usize = 6;

/// A node of the workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Classify,
    Retrieve,
    Grade,
    Rewrite,
    WebSearch,
    Generate,
    Done,
}

impl Node {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classify => "classify",
            Self::Retrieve => "retrieve",
            Self::Grade => "grade",
            Self::Rewrite => "rewrite",
            Self::WebSearch => "web_search",
            Self::Generate => "generate",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a stage lets the graph continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Follow the transition table
    Continue,
    /// Stop the run; the update already carries the answer
    Finish,
}

/// A stage's result: the partial update plus the flow decision.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutput {
    pub update: StateUpdate,
    pub flow: Flow,
}

impl StageOutput {
    pub fn next(update: StateUpdate) -> Self {
        Self {
            update,
            flow: Flow::Continue,
        }
    }

    pub fn finish(update: StateUpdate) -> Self {
        Self {
            update,
            flow: Flow::Finish,
        }
    }
}

/// Branch after classification. Only related questions retrieve documents.
pub fn route_after_classify(query_type: QueryType) -> Node {
    match query_type {
        QueryType::Related => Node::Retrieve,
        QueryType::Illegal | QueryType::NotRelated | QueryType::Unset => Node::Generate,
    }
}

/// Branch after grading.
pub fn route_after_grade(web_search_needed: WebSearchNeeded) -> Node {
    match web_search_needed {
        WebSearchNeeded::Yes => Node::Rewrite,
        WebSearchNeeded::No | WebSearchNeeded::Unset => Node::Generate,
    }
}

/// Node that follows `current` given the state after `current` ran.
pub fn next_node(current: Node, state: &WorkflowState) -> Node {
    match current {
        Node::Classify => route_after_classify(state.query_type),
        Node::Retrieve => Node::Grade,
        Node::Grade => route_after_grade(state.web_search_needed),
        Node::Rewrite => Node::WebSearch,
        Node::WebSearch => Node::Generate,
        Node::Generate | Node::Done => Node::Done,
    }
}
