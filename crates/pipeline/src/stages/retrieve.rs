//! Document retrieval.

use crate::boundary::bounded;
use crate::graph::StageOutput;
use crate::retriever::Retriever;
use crate::state::{StateUpdate, WorkflowState};
use std::sync::Arc;
use std::time::Duration;

/// Answer given when the retriever cannot be reached. Ends the run.
pub const RETRIEVAL_ERROR_MESSAGE: &str = "Unable to fetch the response. Please try again later.";

pub struct RetrieveStage {
    retriever: Arc<dyn Retriever>,
    timeout: Duration,
}

impl RetrieveStage {
    pub fn new(retriever: Arc<dyn Retriever>, timeout: Duration) -> Self {
        Self { retriever, timeout }
    }

    /// Found documents replace the list; nothing found yields an empty list.
    /// A failed call finishes the run with [`RETRIEVAL_ERROR_MESSAGE`] and
    /// leaves `documents` untouched.
    pub async fn run(&self, state: &WorkflowState) -> StageOutput {
        let result = bounded(
            "document retriever",
            self.timeout,
            self.retriever.retrieve(&state.question),
        )
        .await;

        match result {
            Ok(Some(document)) => {
                tracing::info!(chars = document.content.len(), "Document retrieved");
                StageOutput::next(StateUpdate::new().documents(vec![document]))
            }
            Ok(None) => {
                tracing::info!("No document found for question");
                StageOutput::next(StateUpdate::new().documents(Vec::new()))
            }
            Err(e) => {
                tracing::error!("Document retrieval failed, ending run: {}", e);
                StageOutput::finish(StateUpdate::new().generation(RETRIEVAL_ERROR_MESSAGE))
            }
        }
    }
}
