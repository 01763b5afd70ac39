//! TaxGPT Core Library
//!
//! Foundational utilities shared by every TaxGPT crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, GradingPolicy};
pub use error::{AppError, AppResult};
