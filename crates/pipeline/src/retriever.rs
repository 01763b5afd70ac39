//! Document retriever adapter.
//!
//! The retriever is a separate vector-search service. It answers a question
//! with at most one document's text.

use crate::state::Document;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use taxgpt_core::{AppError, AppResult};

/// Source of candidate documents for a question.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// `Ok(None)` means the service answered but found nothing.
    /// `Err` means the service could not be reached or failed.
    async fn retrieve(&self, question: &str) -> AppResult<Option<Document>>;
}

#[derive(Debug, Serialize)]
struct RetrieveRequest<'a> {
    question: &'a str,
}

#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    document: Option<DocumentField>,
}

/// The service returns either plain text or a list of stored documents.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DocumentField {
    Text(String),
    Stored(Vec<StoredDocument>),
}

#[derive(Debug, Deserialize)]
struct StoredDocument {
    #[serde(alias = "content")]
    page_content: String,
}

impl DocumentField {
    fn into_document(self) -> Option<Document> {
        let content = match self {
            Self::Text(text) => text,
            Self::Stored(docs) => docs
                .into_iter()
                .map(|d| d.page_content)
                .find(|c| !c.trim().is_empty())?,
        };

        if content.trim().is_empty() {
            None
        } else {
            Some(Document::new(content))
        }
    }
}

/// HTTP client for the vector-search service.
pub struct HttpRetriever {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpRetriever {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Retrieval(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, question: &str) -> AppResult<Option<Document>> {
        tracing::debug!(endpoint = %self.endpoint, "Querying document retriever");

        // The question goes both as a query parameter and as a JSON body;
        // deployed services read one or the other.
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("question", question)])
            .json(&RetrieveRequest { question })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(format!("Document retriever: {}", e))
                } else {
                    AppError::Retrieval(format!("Failed to reach document retriever: {}", e))
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Retrieval(format!(
                "Document retriever error ({}): {}",
                status, error_text
            )));
        }

        let body: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Invalid retriever response: {}", e)))?;

        Ok(body.document.and_then(DocumentField::into_document))
    }
}
