//! Question rewriting for web search.

use crate::graph::StageOutput;
use crate::model::{vars, ModelHandle};
use crate::state::{StateUpdate, WorkflowState};
use taxgpt_core::{AppError, AppResult};
use taxgpt_prompt::PromptDefinition;

/// Turns a question into a web search query anchored to Indian income tax.
pub struct Rewriter {
    model: ModelHandle,
    prompt: PromptDefinition,
}

impl Rewriter {
    pub fn new(model: ModelHandle, prompt: PromptDefinition) -> Self {
        Self { model, prompt }
    }

    /// Rewrite a question. Fails open: any error returns the input unchanged.
    pub async fn rewrite(&self, question: &str) -> String {
        match self.try_rewrite(question).await {
            Ok(rewritten) => {
                tracing::info!(rewritten = %rewritten, "Question rewritten for web search");
                rewritten
            }
            Err(e) => {
                tracing::warn!("Failed to rewrite question, keeping original: {}", e);
                question.to_string()
            }
        }
    }

    async fn try_rewrite(&self, question: &str) -> AppResult<String> {
        let raw = self
            .model
            .run(&self.prompt, vars([("question", question)]))
            .await?;
        let query = clean_query(&raw);
        if query.is_empty() {
            return Err(AppError::Llm(format!(
                "Rewrite reply has no usable question: {:?}",
                raw
            )));
        }
        Ok(query)
    }

    /// Only the question changes; documents pass through untouched.
    pub async fn run(&self, state: &WorkflowState) -> StageOutput {
        let question = self.rewrite(&state.question).await;
        StageOutput::next(StateUpdate::new().question(question))
    }
}

/// Strip a leading label and surrounding quotes models like to add.
fn clean_query(raw: &str) -> String {
    let line = raw.lines().find(|l| !l.trim().is_empty()).unwrap_or(raw);
    let line = line.trim();
    let line = ["Rewritten question:", "Improved question:", "Query:"]
        .iter()
        .find_map(|label| line.strip_prefix(label))
        .unwrap_or(line);
    line.trim().trim_matches('"').trim().to_string()
}
