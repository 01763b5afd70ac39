//! One module per graph node. Every stage turns the current state into a
//! [`StageOutput`](crate::graph::StageOutput) and never returns an error.

pub mod classify;
pub mod generate;
pub mod grade;
pub mod retrieve;
pub mod rewrite;
pub mod search;

pub use classify::Classifier;
pub use generate::{Generator, GENERATION_ERROR_MESSAGE};
pub use grade::{GradeOutcome, Grader};
pub use retrieve::{RetrieveStage, RETRIEVAL_ERROR_MESSAGE};
pub use rewrite::Rewriter;
pub use search::WebSearchStage;
