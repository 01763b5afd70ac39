//! A pipeline built from configuration, talking HTTP to mock services.

use crate::graph::Node;
use crate::orchestrator::Pipeline;
use crate::state::{Document, QueryType, WorkflowState};
use serde_json::json;
use taxgpt_core::config::ProviderConfig;
use taxgpt_core::AppConfig;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ollama_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "llama3.2",
        "response": text,
        "done": true,
        "prompt_eval_count": 12,
        "eval_count": 3
    }))
}

async fn mount_ollama(server: &MockServer, grade: &str) {
    for (marker, reply) in [
        ("query classifier", "related"),
        ("grader assessing", grade),
        ("question rewriter", "Income tax deductions for salaried employees in India"),
        ("tax expert", "Claim 80C deductions while filing your return."),
    ] {
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_string_contains(marker))
            .respond_with(ollama_reply(reply))
            .mount(server)
            .await;
    }
}

fn config_for(workspace: &TempDir, ollama: &MockServer, services: &MockServer) -> AppConfig {
    let mut config = AppConfig {
        workspace: workspace.path().to_path_buf(),
        provider: "ollama".to_string(),
        model: "llama3.2".to_string(),
        ..AppConfig::default()
    };
    config.llm.providers.insert(
        "ollama".to_string(),
        ProviderConfig::Ollama {
            endpoint: ollama.uri(),
            model: "llama3.2".to_string(),
            timeout: Some(5),
        },
    );
    config.retriever.endpoint = format!("{}/vector", services.uri());
    config.web_search.endpoint = format!("{}/search", services.uri());
    config.web_search.api_key_env = "TAXGPT_TEST_WIRING_TAVILY_KEY".to_string();
    config
}

#[tokio::test]
async fn test_configured_pipeline_answers_from_retriever() {
    let workspace = TempDir::new().unwrap();
    let ollama = MockServer::start().await;
    let services = MockServer::start().await;
    mount_ollama(&ollama, "yes").await;

    Mock::given(method("POST"))
        .and(path("/vector"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "document": "Section 80C allows deductions up to 1.5 lakh"
        })))
        .mount(&services)
        .await;

    let pipeline = Pipeline::from_config(&config_for(&workspace, &ollama, &services)).unwrap();
    let run = pipeline
        .execute(WorkflowState::new("How do I save tax on my salary?"))
        .await;

    assert_eq!(run.state.query_type, QueryType::Related);
    assert_eq!(
        run.state.documents,
        vec![Document::new("Section 80C allows deductions up to 1.5 lakh")]
    );
    assert_eq!(
        run.state.generation,
        "Claim 80C deductions while filing your return."
    );
    assert_eq!(
        run.path,
        vec![Node::Classify, Node::Retrieve, Node::Grade, Node::Generate]
    );
}

#[tokio::test]
async fn test_configured_pipeline_without_search_key_degrades() {
    let workspace = TempDir::new().unwrap();
    let ollama = MockServer::start().await;
    let services = MockServer::start().await;
    mount_ollama(&ollama, "no").await;

    Mock::given(method("POST"))
        .and(path("/vector"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"document": null})))
        .mount(&services)
        .await;

    // The key variable is never set, so the search fails and the run goes on
    let pipeline = Pipeline::from_config(&config_for(&workspace, &ollama, &services)).unwrap();
    let answer = pipeline.run_pipeline("How do I save tax on my salary?").await;

    assert_eq!(answer.query_type, QueryType::Related);
    assert!(answer.documents.is_empty());
    assert_eq!(answer.answer, "Claim 80C deductions while filing your return.");
}

#[tokio::test]
async fn test_workspace_prompt_override_is_used() {
    let workspace = TempDir::new().unwrap();
    let prompts_dir = workspace.path().join(".taxgpt").join("prompts");
    std::fs::create_dir_all(&prompts_dir).unwrap();
    std::fs::write(
        prompts_dir.join("taxgpt.refuse.yml"),
        r#"
id: taxgpt.refuse
title: Custom refusal
apiVersion: "1.0"
createdBy: test
system: You are a polite tax assistant for a firm named Acme Filings.
template: "Question: {{question}}"
output:
  format: text
"#,
    )
    .unwrap();

    let ollama = MockServer::start().await;
    let services = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_string_contains("query classifier"))
        .respond_with(ollama_reply("notrelated"))
        .mount(&ollama)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_string_contains("Acme Filings"))
        .respond_with(ollama_reply("Acme only handles tax questions."))
        .mount(&ollama)
        .await;

    let pipeline = Pipeline::from_config(&config_for(&workspace, &ollama, &services)).unwrap();
    let answer = pipeline.run_pipeline("Best pizza nearby?").await;

    assert_eq!(answer.query_type, QueryType::NotRelated);
    assert_eq!(answer.answer, "Acme only handles tax questions.");
}

#[test]
fn test_unknown_provider_is_rejected() {
    let config = AppConfig {
        provider: "gguf".to_string(),
        ..AppConfig::default()
    };
    assert!(Pipeline::from_config(&config).is_err());
}
