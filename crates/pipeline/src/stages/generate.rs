//! Final answer generation.

use crate::graph::StageOutput;
use crate::model::{vars, ModelHandle};
use crate::state::{Document, QueryType, StateUpdate, WorkflowState};
use taxgpt_core::AppResult;
use taxgpt_prompt::PromptDefinition;

/// Returned when the answer cannot be generated.
pub const GENERATION_ERROR_MESSAGE: &str = "Unable to generate response. Please try again later.";

const NO_CONTEXT: &str = "No supporting documents were found.";

/// Produces the user-facing answer.
///
/// Related questions get an answer grounded in the documents. Everything
/// else gets the refusal prompt, which carries both canned replies and lets
/// the model pick.
pub struct Generator {
    model: ModelHandle,
    answer_prompt: PromptDefinition,
    refuse_prompt: PromptDefinition,
}

impl Generator {
    pub fn new(
        model: ModelHandle,
        answer_prompt: PromptDefinition,
        refuse_prompt: PromptDefinition,
    ) -> Self {
        Self {
            model,
            answer_prompt,
            refuse_prompt,
        }
    }

    /// Generate an answer. Never fails and never returns an empty string.
    pub async fn generate(
        &self,
        query_type: QueryType,
        question: &str,
        documents: &[Document],
    ) -> String {
        let result = match query_type {
            QueryType::Related => self.answer(question, documents).await,
            QueryType::Illegal | QueryType::NotRelated | QueryType::Unset => {
                self.refuse(question).await
            }
        };

        match result {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!(query_type = %query_type, "Failed to generate answer: {}", e);
                GENERATION_ERROR_MESSAGE.to_string()
            }
        }
    }

    async fn answer(&self, question: &str, documents: &[Document]) -> AppResult<String> {
        let context = build_context(documents);
        self.model
            .run(
                &self.answer_prompt,
                vars([("question", question), ("context", &context)]),
            )
            .await
    }

    async fn refuse(&self, question: &str) -> AppResult<String> {
        self.model
            .run(&self.refuse_prompt, vars([("question", question)]))
            .await
    }

    pub async fn run(&self, state: &WorkflowState) -> StageOutput {
        let generation = self
            .generate(state.query_type, &state.question, &state.documents)
            .await;
        StageOutput::next(StateUpdate::new().generation(generation))
    }
}

/// Number the documents and separate them for the answer prompt.
fn build_context(documents: &[Document]) -> String {
    if documents.is_empty() {
        return NO_CONTEXT.to_string();
    }

    let mut context = String::new();
    for (i, document) in documents.iter().enumerate() {
        context.push_str(&format!("[Document {}]\n", i + 1));
        context.push_str(document.content.trim());
        context.push_str("\n\n---\n\n");
    }
    context
}
