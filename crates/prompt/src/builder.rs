//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use std::collections::HashMap;
use taxgpt_core::{AppError, AppResult};

/// Build a prompt from a definition and input variables.
///
/// Both the system message and the user template are rendered with the same
/// variables.
///
/// # Example
/// ```no_run
/// use taxgpt_prompt::{build_prompt, builtin_prompt, CLASSIFY_PROMPT};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = builtin_prompt(CLASSIFY_PROMPT)?;
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "Is gratuity taxable?".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::trace!("Building prompt: {}", definition.id);

    let system = definition
        .system
        .as_deref()
        .map(|s| render_template(s, &variables))
        .transpose()?
        .map(|s| s.trim_end().to_string());

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.sampling.clone(),
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PromptOutputSpec, PromptSampling};

    fn create_test_definition(system: Option<&str>) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            system: system.map(str::to_string),
            template: "Question: {{question}}".to_string(),
            sampling: PromptSampling {
                temperature: Some(0.0),
                max_tokens: None,
            },
            output: PromptOutputSpec {
                format: "text".to_string(),
            },
        }
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Hello, world!".to_string());

        let result = render_template("Question: {{question}}", &vars).unwrap();
        assert_eq!(result, "Question: Hello, world!");
    }

    #[test]
    fn test_render_does_not_escape() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Is 80C > 80D & why?".to_string());

        let result = render_template("{{question}}", &vars).unwrap();
        assert_eq!(result, "Is 80C > 80D & why?");
    }

    #[test]
    fn test_build_prompt_with_system() {
        let def = create_test_definition(Some("You answer about {{topic}}.\n"));
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Test question".to_string());
        vars.insert("topic".to_string(), "tax".to_string());

        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(built.user, "Question: Test question");
        assert_eq!(built.system.as_deref(), Some("You answer about tax."));
        assert_eq!(built.sampling.temperature, Some(0.0));
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
    }

    #[test]
    fn test_build_prompt_without_system() {
        let def = create_test_definition(None);
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Test question".to_string());

        let built = build_prompt(&def, vars).unwrap();
        assert!(built.system.is_none());
    }

    #[test]
    fn test_render_template_missing_variable() {
        let vars = HashMap::new();
        // Handlebars renders missing variables as empty string
        let result = render_template("Question: {{missing}}", &vars).unwrap();
        assert_eq!(result, "Question: ");
    }

    #[test]
    fn test_render_template_invalid_syntax() {
        let vars = HashMap::new();
        let result = render_template("Question: {{#if}}", &vars);
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }
}
