//! TaxGPT question-answering pipeline.
//!
//! A question is classified, then either answered from retrieved documents
//! (with a web search fallback when none are relevant) or politely refused.
//!
//! ```text
//! classify -> retrieve -> grade -> [rewrite -> web_search] -> generate -> done
//! ```
//!
//! Every stage has a fallback, so a run always ends with an answer string.
//! The only early exit is an unreachable document retriever.

pub mod boundary;
pub mod graph;
pub mod labels;
pub mod model;
pub mod orchestrator;
pub mod retriever;
pub mod stages;
pub mod state;
pub mod web_search;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;

// Re-export main types
pub use graph::{Flow, Node, StageOutput};
pub use orchestrator::{Pipeline, PipelineDeps, PipelineRun, PipelineSettings};
pub use retriever::{HttpRetriever, Retriever};
pub use stages::{GENERATION_ERROR_MESSAGE, RETRIEVAL_ERROR_MESSAGE};
pub use state::{Document, PipelineAnswer, QueryType, StateUpdate, WebSearchNeeded, WorkflowState};
pub use web_search::{Snippet, TavilySearch, WebSearch};
