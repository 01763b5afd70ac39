//! Ask command handler.
//!
//! Runs one question through the pipeline and prints the answer.

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use taxgpt_core::{AppConfig, AppError, AppResult, GradingPolicy};
use taxgpt_pipeline::{Document, Pipeline, PipelineRun, QueryType, WorkflowState};

/// Ask a tax question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Output as JSON, including the stages visited
    #[arg(long)]
    pub json: bool,

    /// What a failed relevance grade does (independent, abort-on-failure)
    #[arg(long)]
    pub grading_policy: Option<String>,
}

/// JSON shape printed by `ask --json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AskOutput<'a> {
    answer: &'a str,
    query_type: QueryType,
    documents: &'a [Document],
    path: Vec<&'static str>,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.get_question()?;

        let mut config = config.clone();
        if let Some(ref policy) = self.grading_policy {
            config.pipeline.grading_policy = GradingPolicy::parse(policy).ok_or_else(|| {
                AppError::Config(format!(
                    "Unknown grading policy: {}. Supported: independent, abort-on-failure",
                    policy
                ))
            })?;
        }

        let pipeline = Pipeline::from_config(&config)?;
        let run = pipeline.execute(WorkflowState::new(question)).await;

        println!("{}", self.render(&run)?);
        Ok(())
    }

    fn render(&self, run: &PipelineRun) -> AppResult<String> {
        if !self.json {
            return Ok(run.state.generation.clone());
        }

        let output = AskOutput {
            answer: &run.state.generation,
            query_type: run.state.query_type,
            documents: &run.state.documents,
            path: run.path_names(),
        };
        Ok(serde_json::to_string_pretty(&output)?)
    }

    /// Get the question text from the argument or the file.
    fn get_question(&self) -> AppResult<String> {
        if let Some(ref question) = self.question {
            return Ok(question.clone());
        }

        match self.file {
            Some(ref path) => {
                let text = std::fs::read_to_string(path).inspect_err(|e| {
                    tracing::error!("Failed to read question file {:?}: {}", path, e)
                })?;
                Ok(text.trim().to_string())
            }
            None => Err(AppError::Config("No question provided".to_string())),
        }
    }
}
