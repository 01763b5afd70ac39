//! Run-scoped workflow state and the partial updates stages return.
//!
//! A [`WorkflowState`] is created per question and never shared between runs.
//! Stages never mutate it: they return a [`StateUpdate`] and the orchestrator
//! builds the next state value with [`WorkflowState::apply`].

use serde::{Deserialize, Serialize};

/// A candidate passage. Content is its only identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Intent assigned to a question by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// A legitimate tax question
    Related,
    /// A tax question asking for help with something illegal
    Illegal,
    /// Not about tax
    NotRelated,
    /// Not classified yet
    #[default]
    Unset,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Related => "related",
            Self::Illegal => "illegal",
            Self::NotRelated => "notrelated",
            Self::Unset => "unset",
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grader decision on whether the run falls back to web search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebSearchNeeded {
    Yes,
    No,
    #[default]
    Unset,
}

impl WebSearchNeeded {
    /// `Yes` iff no relevant document survived grading.
    pub fn for_relevant(relevant: &[Document]) -> Self {
        if relevant.is_empty() {
            Self::Yes
        } else {
            Self::No
        }
    }
}

/// State threaded through one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    /// Current question; the rewriter may replace it
    pub question: String,
    /// The question as asked, kept for logging
    pub original_question: String,
    pub query_type: QueryType,
    /// Output of the most recent document-producing stage
    pub documents: Vec<Document>,
    pub web_search_needed: WebSearchNeeded,
    /// Final answer; empty until the generator (or an early exit) sets it
    pub generation: String,
}

impl WorkflowState {
    /// Fresh state for a question: everything else empty or unset.
    pub fn new(question: impl Into<String>) -> Self {
        let question = question.into();
        Self {
            original_question: question.clone(),
            question,
            ..Self::default()
        }
    }

    /// Produce the next state by overlaying `update` on this one.
    ///
    /// Fields present in the update replace the current value wholesale;
    /// documents are never merged. `query_type` is write-once.
    pub fn apply(self, update: StateUpdate) -> Self {
        let query_type = match update.query_type {
            Some(next) if self.query_type == QueryType::Unset => next,
            Some(next) => {
                tracing::warn!(
                    current = %self.query_type,
                    rejected = %next,
                    "Ignoring second classification of the same run"
                );
                self.query_type
            }
            None => self.query_type,
        };

        Self {
            question: update.question.unwrap_or(self.question),
            original_question: self.original_question,
            query_type,
            documents: update.documents.unwrap_or(self.documents),
            web_search_needed: update.web_search_needed.unwrap_or(self.web_search_needed),
            generation: update.generation.unwrap_or(self.generation),
        }
    }
}

/// Partial state returned by a stage. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub question: Option<String>,
    pub query_type: Option<QueryType>,
    pub documents: Option<Vec<Document>>,
    pub web_search_needed: Option<WebSearchNeeded>,
    pub generation: Option<String>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = Some(query_type);
        self
    }

    pub fn documents(mut self, documents: Vec<Document>) -> Self {
        self.documents = Some(documents);
        self
    }

    pub fn web_search_needed(mut self, needed: WebSearchNeeded) -> Self {
        self.web_search_needed = Some(needed);
        self
    }

    pub fn generation(mut self, generation: impl Into<String>) -> Self {
        self.generation = Some(generation.into());
        self
    }
}

/// What the caller of a run gets back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineAnswer {
    pub answer: String,
    pub query_type: QueryType,
    pub documents: Vec<Document>,
}

impl From<WorkflowState> for PipelineAnswer {
    fn from(state: WorkflowState) -> Self {
        Self {
            answer: state.generation,
            query_type: state.query_type,
            documents: state.documents,
        }
    }
}
