//! A pipeline that never leaves the process, for command tests.

use std::sync::Arc;
use taxgpt_core::{AppError, AppResult};
use taxgpt_llm::{LlmClient, LlmRequest, LlmResponse};
use taxgpt_pipeline::{
    Document, Pipeline, PipelineDeps, PipelineSettings, Retriever, Snippet, WebSearch,
};
use taxgpt_prompt::PromptSet;

pub const REDIRECT: &str =
    "I can only assist with tax-related queries. Please try rephrasing your question.";

/// Classifies everything as unrelated and refuses.
struct RefusingLlm;

#[async_trait::async_trait]
impl LlmClient for RefusingLlm {
    fn provider_name(&self) -> &str {
        "refusing"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let classifying = request
            .system
            .as_deref()
            .is_some_and(|s| s.contains("query classifier"));
        let content = if classifying { "notrelated" } else { REDIRECT };
        Ok(LlmResponse::new(content, &request.model))
    }
}

struct NoRetriever;

#[async_trait::async_trait]
impl Retriever for NoRetriever {
    async fn retrieve(&self, _question: &str) -> AppResult<Option<Document>> {
        Ok(None)
    }
}

struct NoSearch;

#[async_trait::async_trait]
impl WebSearch for NoSearch {
    async fn search(&self, _query: &str, _max_results: usize) -> AppResult<Vec<Snippet>> {
        Err(AppError::WebSearch("offline".to_string()))
    }
}

pub fn fake_pipeline() -> Pipeline {
    Pipeline::new(
        PipelineDeps {
            llm: Arc::new(RefusingLlm),
            retriever: Arc::new(NoRetriever),
            web_search: Arc::new(NoSearch),
        },
        PromptSet::builtin().unwrap(),
        PipelineSettings::default(),
    )
}
