//! LLM integration crate for TaxGPT.
//!
//! Provider-agnostic access to Large Language Models through the
//! [`LlmClient`] trait.
//!
//! # Providers
//! - **OpenAI**: chat completions (default)
//! - **Ollama**: local LLM runtime
//!
//! # Example
//! ```no_run
//! use taxgpt_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("What is Section 80C?", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, ProviderType};
pub use providers::{OllamaClient, OpenAiClient};
