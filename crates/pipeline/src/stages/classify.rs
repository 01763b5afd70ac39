//! Intent classification.

use crate::graph::StageOutput;
use crate::labels::parse_query_type;
use crate::model::{vars, ModelHandle};
use crate::state::{QueryType, StateUpdate, WorkflowState};
use taxgpt_core::AppResult;
use taxgpt_prompt::PromptDefinition;

/// Labels a question as related, illegal or not related to tax.
pub struct Classifier {
    model: ModelHandle,
    prompt: PromptDefinition,
}

impl Classifier {
    pub fn new(model: ModelHandle, prompt: PromptDefinition) -> Self {
        Self { model, prompt }
    }

    /// Classify a question. Fails closed: any error yields `NotRelated`.
    pub async fn classify(&self, question: &str) -> QueryType {
        match self.try_classify(question).await {
            Ok(query_type) => {
                tracing::info!(query_type = %query_type, "Query classified");
                query_type
            }
            Err(e) => {
                tracing::error!("Failed to classify query, treating as notrelated: {}", e);
                QueryType::NotRelated
            }
        }
    }

    async fn try_classify(&self, question: &str) -> AppResult<QueryType> {
        let raw = self
            .model
            .run(&self.prompt, vars([("question", question)]))
            .await?;
        parse_query_type(&raw)
    }

    pub async fn run(&self, state: &WorkflowState) -> StageOutput {
        let query_type = self.classify(&state.question).await;
        StageOutput::next(StateUpdate::new().query_type(query_type))
    }
}
