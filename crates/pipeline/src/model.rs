//! Prompt-driven calls to the language model.

use crate::boundary::bounded;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use taxgpt_core::{AppError, AppResult};
use taxgpt_llm::{LlmClient, LlmRequest};
use taxgpt_prompt::{build_prompt, PromptDefinition};

/// A shared LLM client bound to one model and one time budget.
#[derive(Clone)]
pub struct ModelHandle {
    client: Arc<dyn LlmClient>,
    model: String,
    timeout: Duration,
}

impl ModelHandle {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            model: model.into(),
            timeout,
        }
    }

    /// Render `prompt` with `variables`, send it, and return the reply text.
    ///
    /// A blank reply counts as a failure.
    pub async fn run(
        &self,
        prompt: &PromptDefinition,
        variables: HashMap<String, String>,
    ) -> AppResult<String> {
        let built = build_prompt(prompt, variables)?;

        let mut request = LlmRequest::new(built.user, &self.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(temperature) = built.sampling.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = built.sampling.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = bounded(
            &built.metadata.source_prompt_id,
            self.timeout,
            self.client.complete(&request),
        )
        .await?;

        tracing::debug!(
            prompt = %built.metadata.source_prompt_id,
            provider = self.client.provider_name(),
            total_tokens = response.usage.total_tokens,
            "Model call finished"
        );

        let content = response.content.trim();
        if content.is_empty() {
            return Err(AppError::Llm(format!(
                "Empty reply for prompt {}",
                built.metadata.source_prompt_id
            )));
        }

        Ok(content.to_string())
    }
}

/// Build a variable map from `(name, value)` pairs.
pub fn vars<const N: usize>(pairs: [(&str, &str); N]) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
