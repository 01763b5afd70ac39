//! LLM provider factory.
//!
//! Resolves a provider name plus its endpoint, secret and time budget into a
//! shared client handle.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use std::sync::Arc;
use std::time::Duration;
use taxgpt_core::{AppError, AppResult};

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    OpenAI,
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
        }
    }
}

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key (required by OpenAI)
/// * `timeout` - HTTP time budget for each completion
///
/// # Errors
/// Returns an error if the provider is unknown or a required secret is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    tracing::debug!(provider = provider_type.as_str(), ?endpoint, "Creating LLM client");

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            Ok(Arc::new(OllamaClient::with_timeout(base_url, timeout)?))
        }
        ProviderType::OpenAI => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI provider requires API key".to_string())
            })?;
            let client = match endpoint {
                Some(url) => OpenAiClient::with_base_url(url, api_key),
                None => OpenAiClient::new(api_key),
            };
            Ok(Arc::new(client.timeout(timeout)?))
        }
    }
}
