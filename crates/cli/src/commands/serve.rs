//! Serve command: the pipeline behind a small HTTP API.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use taxgpt_core::{AppConfig, AppResult};
use taxgpt_pipeline::Pipeline;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Serve the question-answering API over HTTP
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8000", env = "TAXGPT_ADDR")]
    pub addr: SocketAddr,
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub generation: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let pipeline = Arc::new(Pipeline::from_config(config)?);
        let app = router(pipeline);

        let listener = TcpListener::bind(self.addr).await.inspect_err(|e| {
            tracing::error!("Failed to bind {}: {}", self.addr, e)
        })?;
        tracing::info!("Listening on {}", self.addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/response", post(respond))
        .route("/health", get(health))
        .with_state(pipeline)
        .layer(TraceLayer::new_for_http())
}

/// POST /response - answer one question
pub async fn respond(
    State(pipeline): State<Arc<Pipeline>>,
    Json(request): Json<QuestionRequest>,
) -> Json<GenerationResponse> {
    let answer = pipeline.run_pipeline(&request.question).await;
    Json(GenerationResponse {
        generation: answer.answer,
    })
}

/// GET /health - liveness
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fakes::{fake_pipeline, REDIRECT};

    #[tokio::test]
    async fn test_respond_returns_generation() {
        let Json(response) = respond(
            State(Arc::new(fake_pipeline())),
            Json(QuestionRequest {
                question: "Who won the IPL last year?".to_string(),
            }),
        )
        .await;
        assert_eq!(response.generation, REDIRECT);
    }

    #[tokio::test]
    async fn test_health() {
        let Json(response) = health().await;
        assert_eq!(response.status, "ok");
        assert!(!response.version.is_empty());
    }

    #[test]
    fn test_request_shape() {
        let request: QuestionRequest =
            serde_json::from_str(r#"{"question": "What is TDS?"}"#).unwrap();
        assert_eq!(request.question, "What is TDS?");
        assert!(serde_json::from_str::<QuestionRequest>("{}").is_err());
    }

    #[test]
    fn test_router_builds() {
        let _ = router(Arc::new(fake_pipeline()));
    }
}
