//! Prompt system for TaxGPT.
//!
//! - YAML prompt definitions, embedded in the binary
//! - Per-workspace overrides from `.taxgpt/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{
    builtin_prompt, load_prompt, PromptSet, ANSWER_PROMPT, CLASSIFY_PROMPT, GRADE_PROMPT,
    REFUSE_PROMPT, REWRITE_PROMPT,
};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOutputSpec, PromptSampling,
};
