//! Workflow engine.
//!
//! Walks the graph from `classify` to `done`, one stage at a time, building a
//! new [`WorkflowState`] after every step. The [`Pipeline`] holds only shared
//! collaborator handles, so one instance serves concurrent runs.

use crate::graph::{next_node, Flow, Node, StageOutput, MAX_STEPS};
use crate::model::ModelHandle;
use crate::retriever::{HttpRetriever, Retriever};
use crate::stages::{Classifier, Generator, Grader, RetrieveStage, Rewriter, WebSearchStage};
use crate::state::{PipelineAnswer, WorkflowState};
use crate::web_search::{TavilySearch, WebSearch};
use std::sync::Arc;
use std::time::Duration;
use taxgpt_core::config::ProviderConfig;
use taxgpt_core::{AppConfig, AppResult, GradingPolicy};
use taxgpt_llm::{create_client, LlmClient};
use taxgpt_prompt::PromptSet;
use tracing::Instrument;

/// External collaborators a pipeline talks to.
#[derive(Clone)]
pub struct PipelineDeps {
    pub llm: Arc<dyn LlmClient>,
    pub retriever: Arc<dyn Retriever>,
    pub web_search: Arc<dyn WebSearch>,
}

/// Tunables for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    /// Budget for each model call
    pub llm_timeout: Duration,
    pub retriever_timeout: Duration,
    pub web_search_timeout: Duration,
    /// Snippets requested from web search
    pub max_results: usize,
    pub grading_policy: GradingPolicy,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            llm_timeout: config.pipeline.llm_timeout(),
            retriever_timeout: config.retriever.timeout(),
            web_search_timeout: config.web_search.timeout(),
            max_results: config.web_search.max_results,
            grading_policy: config.pipeline.grading_policy,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            llm_timeout: Duration::from_secs(30),
            retriever_timeout: Duration::from_secs(10),
            web_search_timeout: Duration::from_secs(10),
            max_results: 3,
            grading_policy: GradingPolicy::default(),
        }
    }
}

/// A finished run: the final state and the nodes visited, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub state: WorkflowState,
    pub path: Vec<Node>,
}

impl PipelineRun {
    pub fn path_names(&self) -> Vec<&'static str> {
        self.path.iter().map(Node::as_str).collect()
    }
}

/// The question-answering workflow.
pub struct Pipeline {
    classifier: Classifier,
    retrieve: RetrieveStage,
    grader: Grader,
    rewriter: Rewriter,
    web_search: WebSearchStage,
    generator: Generator,
}

impl Pipeline {
    pub fn new(deps: PipelineDeps, prompts: PromptSet, settings: PipelineSettings) -> Self {
        let model = ModelHandle::new(deps.llm, settings.model, settings.llm_timeout);

        Self {
            classifier: Classifier::new(model.clone(), prompts.classify),
            retrieve: RetrieveStage::new(deps.retriever, settings.retriever_timeout),
            grader: Grader::new(model.clone(), prompts.grade, settings.grading_policy),
            rewriter: Rewriter::new(model.clone(), prompts.rewrite),
            web_search: WebSearchStage::new(
                deps.web_search,
                settings.max_results,
                settings.web_search_timeout,
            ),
            generator: Generator::new(model, prompts.answer, prompts.refuse),
        }
    }

    /// Build a pipeline wired to the configured provider and services.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let provider_config = config.get_provider_config(&config.provider);
        let endpoint = provider_config.and_then(|pc| pc.endpoint());

        // A local Ollama may be given its own, usually longer, HTTP budget
        let http_timeout = match provider_config {
            Some(ProviderConfig::Ollama {
                timeout: Some(secs),
                ..
            }) if *secs > 0 => Duration::from_secs(*secs),
            _ => config.pipeline.llm_timeout(),
        };

        let api_key = config.resolve_api_key(&config.provider);
        let llm = create_client(&config.provider, endpoint, api_key.as_deref(), http_timeout)?;

        let retriever = HttpRetriever::new(&config.retriever.endpoint, config.retriever.timeout())?;

        let web_search_key = config.web_search.resolve_api_key();
        if web_search_key.is_none() {
            tracing::warn!(
                env = %config.web_search.api_key_env,
                "No web search API key; the web search fallback will return nothing"
            );
        }
        let web_search = TavilySearch::new(
            &config.web_search.endpoint,
            web_search_key,
            config.web_search.timeout(),
        )?;

        let prompts = PromptSet::load(&config.prompts_dir())?;

        tracing::debug!(
            provider = %config.provider,
            model = %config.model,
            retriever = %config.retriever.endpoint,
            "Pipeline configured"
        );

        Ok(Self::new(
            PipelineDeps {
                llm,
                retriever: Arc::new(retriever),
                web_search: Arc::new(web_search),
            },
            prompts,
            PipelineSettings::from_config(config),
        ))
    }

    /// Answer one question.
    pub async fn run_pipeline(&self, question: &str) -> PipelineAnswer {
        self.execute(WorkflowState::new(question)).await.state.into()
    }

    /// Run the graph from `classify` until `done` or an early finish.
    pub async fn execute(&self, initial: WorkflowState) -> PipelineRun {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("pipeline", run_id = %run_id);

        async move {
            tracing::info!(question = %initial.question, "Pipeline run started");

            let mut state = initial;
            let mut path = Vec::with_capacity(MAX_STEPS);
            let mut node = Node::Classify;

            while node != Node::Done {
                path.push(node);
                let output = self
                    .step(node, &state)
                    .instrument(tracing::info_span!("node", name = node.as_str()))
                    .await;

                state = state.apply(output.update);
                node = match output.flow {
                    Flow::Continue => next_node(node, &state),
                    Flow::Finish => Node::Done,
                };
            }

            let path_names: Vec<&str> = path.iter().map(Node::as_str).collect();
            tracing::info!(
                query_type = %state.query_type,
                documents = state.documents.len(),
                path = %path_names.join(" -> "),
                "Pipeline run finished"
            );

            PipelineRun { state, path }
        }
        .instrument(span)
        .await
    }

    async fn step(&self, node: Node, state: &WorkflowState) -> StageOutput {
        match node {
            Node::Classify => self.classifier.run(state).await,
            Node::Retrieve => self.retrieve.run(state).await,
            Node::Grade => self.grader.run(state).await,
            Node::Rewrite => self.rewriter.run(state).await,
            Node::WebSearch => self.web_search.run(state).await,
            Node::Generate => self.generator.run(state).await,
            Node::Done => StageOutput::finish(Default::default()),
        }
    }
}
