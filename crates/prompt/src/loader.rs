//! Prompt loader.
//!
//! Every prompt the pipeline needs ships embedded in the binary. A workspace
//! can override any of them with `.taxgpt/prompts/<id>.yml`.

use crate::types::PromptDefinition;
use std::path::Path;
use taxgpt_core::{AppError, AppResult};

pub const CLASSIFY_PROMPT: &str = "taxgpt.classify";
pub const GRADE_PROMPT: &str = "taxgpt.grade";
pub const REWRITE_PROMPT: &str = "taxgpt.rewrite";
pub const ANSWER_PROMPT: &str = "taxgpt.answer";
pub const REFUSE_PROMPT: &str = "taxgpt.refuse";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (CLASSIFY_PROMPT, include_str!("../prompts/taxgpt.classify.yml")),
    (GRADE_PROMPT, include_str!("../prompts/taxgpt.grade.yml")),
    (REWRITE_PROMPT, include_str!("../prompts/taxgpt.rewrite.yml")),
    (ANSWER_PROMPT, include_str!("../prompts/taxgpt.answer.yml")),
    (REFUSE_PROMPT, include_str!("../prompts/taxgpt.refuse.yml")),
];

/// Load the built-in definition of a prompt.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<PromptDefinition> {
    let (_, source) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown built-in prompt: {}", prompt_id)))?;

    parse_prompt(source, prompt_id)
}

/// Load a prompt definition by ID, preferring a file in `prompts_dir`.
///
/// # Arguments
/// * `prompts_dir` - Directory searched for `<id>.yml` overrides
/// * `prompt_id` - Prompt identifier (e.g., "taxgpt.classify")
///
/// # Example
/// ```no_run
/// use taxgpt_prompt::{load_prompt, REWRITE_PROMPT};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new(".taxgpt/prompts"), REWRITE_PROMPT)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir.join(format!("{}.yml", prompt_id));

    if !prompt_file.exists() {
        return builtin_prompt(prompt_id);
    }

    tracing::debug!("Loading prompt override from: {:?}", prompt_file);

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition = parse_prompt(&contents, &prompt_file.display().to_string())?;

    if definition.id != prompt_id {
        return Err(AppError::Prompt(format!(
            "Prompt file {:?} declares id '{}', expected '{}'",
            prompt_file, definition.id, prompt_id
        )));
    }

    tracing::info!("Using prompt override: {} ({})", definition.id, definition.title);

    Ok(definition)
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e))
    })?;

    validate_prompt(&definition)?;

    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

/// The full set of prompts one pipeline uses.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub classify: PromptDefinition,
    pub grade: PromptDefinition,
    pub rewrite: PromptDefinition,
    pub answer: PromptDefinition,
    pub refuse: PromptDefinition,
}

impl PromptSet {
    /// Built-in prompts only.
    pub fn builtin() -> AppResult<Self> {
        Ok(Self {
            classify: builtin_prompt(CLASSIFY_PROMPT)?,
            grade: builtin_prompt(GRADE_PROMPT)?,
            rewrite: builtin_prompt(REWRITE_PROMPT)?,
            answer: builtin_prompt(ANSWER_PROMPT)?,
            refuse: builtin_prompt(REFUSE_PROMPT)?,
        })
    }

    /// Built-in prompts with any overrides found in `prompts_dir`.
    pub fn load(prompts_dir: &Path) -> AppResult<Self> {
        Ok(Self {
            classify: load_prompt(prompts_dir, CLASSIFY_PROMPT)?,
            grade: load_prompt(prompts_dir, GRADE_PROMPT)?,
            rewrite: load_prompt(prompts_dir, REWRITE_PROMPT)?,
            answer: load_prompt(prompts_dir, ANSWER_PROMPT)?,
            refuse: load_prompt(prompts_dir, REFUSE_PROMPT)?,
        })
    }
}
