//! Relevance grading of candidate documents.

use crate::graph::StageOutput;
use crate::labels::{parse_relevance, Relevance};
use crate::model::{vars, ModelHandle};
use crate::state::{Document, StateUpdate, WebSearchNeeded, WorkflowState};
use taxgpt_core::{AppResult, GradingPolicy};
use taxgpt_prompt::PromptDefinition;

/// Result of grading a batch of documents.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeOutcome {
    /// Documents graded relevant, in input order
    pub relevant: Vec<Document>,
    pub web_search_needed: WebSearchNeeded,
}

impl GradeOutcome {
    fn from_relevant(relevant: Vec<Document>) -> Self {
        let web_search_needed = WebSearchNeeded::for_relevant(&relevant);
        Self {
            relevant,
            web_search_needed,
        }
    }
}

/// Keeps only the documents a model judges relevant to the question.
pub struct Grader {
    model: ModelHandle,
    prompt: PromptDefinition,
    policy: GradingPolicy,
}

impl Grader {
    pub fn new(model: ModelHandle, prompt: PromptDefinition, policy: GradingPolicy) -> Self {
        Self {
            model,
            prompt,
            policy,
        }
    }

    /// Grade documents one at a time, in order.
    ///
    /// Under [`GradingPolicy::Independent`] a failed call drops only that
    /// document. Under [`GradingPolicy::AbortOnFailure`] the first failure
    /// discards the whole batch, including documents already kept.
    pub async fn grade(&self, question: &str, documents: &[Document]) -> GradeOutcome {
        let mut relevant = Vec::with_capacity(documents.len());

        for (index, document) in documents.iter().enumerate() {
            match self.grade_one(question, document).await {
                Ok(Relevance::Yes) => {
                    tracing::debug!(index, "Document graded relevant");
                    relevant.push(document.clone());
                }
                Ok(Relevance::No) => {
                    tracing::debug!(index, "Document graded not relevant");
                }
                Err(e) => match self.policy {
                    GradingPolicy::Independent => {
                        tracing::warn!(index, "Failed to grade document, dropping it: {}", e);
                    }
                    GradingPolicy::AbortOnFailure => {
                        tracing::warn!(index, "Failed to grade document, discarding batch: {}", e);
                        return GradeOutcome::from_relevant(Vec::new());
                    }
                },
            }
        }

        tracing::info!(
            graded = documents.len(),
            relevant = relevant.len(),
            "Documents graded"
        );
        GradeOutcome::from_relevant(relevant)
    }

    async fn grade_one(&self, question: &str, document: &Document) -> AppResult<Relevance> {
        let raw = self
            .model
            .run(
                &self.prompt,
                vars([("question", question), ("document", &document.content)]),
            )
            .await?;
        parse_relevance(&raw)
    }

    pub async fn run(&self, state: &WorkflowState) -> StageOutput {
        let outcome = self.grade(&state.question, &state.documents).await;
        StageOutput::next(
            StateUpdate::new()
                .documents(outcome.relevant)
                .web_search_needed(outcome.web_search_needed),
        )
    }
}
