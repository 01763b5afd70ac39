//! In-crate fakes for the pipeline's collaborators.

use crate::retriever::Retriever;
use crate::state::Document;
use crate::web_search::{Snippet, WebSearch};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use taxgpt_core::{AppError, AppResult};
use taxgpt_llm::{LlmClient, LlmRequest, LlmResponse};

/// Which built-in prompt a request was rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Classify,
    Grade,
    Rewrite,
    Answer,
    Refuse,
}

impl PromptKind {
    /// Recognize a request by the system message of the built-in prompts.
    pub fn of(request: &LlmRequest) -> Option<Self> {
        let system = request.system.as_deref()?;
        if system.contains("query classifier") {
            Some(Self::Classify)
        } else if system.contains("grader assessing") {
            Some(Self::Grade)
        } else if system.contains("question rewriter") {
            Some(Self::Rewrite)
        } else if system.contains("polite tax assistant") {
            Some(Self::Refuse)
        } else if system.contains("tax expert") {
            Some(Self::Answer)
        } else {
            None
        }
    }
}

type Responder = Box<dyn Fn(PromptKind, &LlmRequest) -> AppResult<String> + Send + Sync>;

/// LLM fake answering through a closure, recording every request.
pub struct ScriptedLlm {
    responder: Responder,
    calls: Mutex<Vec<(PromptKind, LlmRequest)>>,
}

impl ScriptedLlm {
    pub fn new(
        responder: impl Fn(PromptKind, &LlmRequest) -> AppResult<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far, in order.
    pub fn calls(&self) -> Vec<(PromptKind, LlmRequest)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// How many requests used the given prompt.
    pub fn count(&self, kind: PromptKind) -> usize {
        self.calls().iter().filter(|(k, _)| *k == kind).count()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let kind = PromptKind::of(request)
            .ok_or_else(|| AppError::Llm("Request from an unknown prompt".to_string()))?;
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((kind, request.clone()));
        }
        let content = (self.responder)(kind, request)?;
        Ok(LlmResponse::new(content, &request.model))
    }
}

/// LLM fake that never answers.
pub struct HangingLlm;

#[async_trait::async_trait]
impl LlmClient for HangingLlm {
    fn provider_name(&self) -> &str {
        "hanging"
    }

    async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
        std::future::pending().await
    }
}

/// What a [`StaticRetriever`] answers.
#[derive(Debug, Clone)]
pub enum RetrieverReply {
    Found(String),
    NotFound,
    Unreachable,
}

/// Retriever fake with a fixed reply.
pub struct StaticRetriever {
    reply: RetrieverReply,
    calls: AtomicUsize,
}

impl StaticRetriever {
    pub fn new(reply: RetrieverReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn found(content: &str) -> Self {
        Self::new(RetrieverReply::Found(content.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, _question: &str) -> AppResult<Option<Document>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            RetrieverReply::Found(content) => Ok(Some(Document::new(content.clone()))),
            RetrieverReply::NotFound => Ok(None),
            RetrieverReply::Unreachable => Err(AppError::Retrieval(
                "connection refused".to_string(),
            )),
        }
    }
}

/// Web search fake returning fixed snippets, or failing when `None`.
pub struct StaticWebSearch {
    snippets: Option<Vec<String>>,
    queries: Mutex<Vec<String>>,
}

impl StaticWebSearch {
    pub fn new(snippets: &[&str]) -> Self {
        Self {
            snippets: Some(snippets.iter().map(|s| s.to_string()).collect()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            snippets: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Queries received so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl WebSearch for StaticWebSearch {
    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<Snippet>> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }
        match &self.snippets {
            Some(snippets) => Ok(snippets
                .iter()
                .take(max_results)
                .map(|s| Snippet::new(s.clone()))
                .collect()),
            None => Err(AppError::WebSearch("search backend down".to_string())),
        }
    }
}
