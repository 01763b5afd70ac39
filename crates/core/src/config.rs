//! Configuration management for TaxGPT.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (.taxgpt/config.yaml)
//! - Environment variables (a `.env` file in the working directory is honored)
//! - Command-line flags
//!
//! Later sources win.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Default endpoint of the document retriever service.
pub const DEFAULT_RETRIEVER_ENDPOINT: &str = "http://localhost:5001/vector";

/// Default web search endpoint (Tavily search API).
pub const DEFAULT_WEB_SEARCH_ENDPOINT: &str = "https://api.tavily.com/search";

/// Main application configuration.
///
/// One value is built at startup and handed to the pipeline builder, so every
/// client handle, endpoint and timeout is explicit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .taxgpt/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Active LLM provider ("openai" or "ollama")
    pub provider: String,

    /// Model identifier for the active provider
    pub model: String,

    /// Explicit API key, overrides the provider's `apiKeyEnv`
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Log output format ("text" or "json")
    pub log_format: String,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: LlmConfig,

    /// Document retriever service
    pub retriever: RetrieverConfig,

    /// Web search service
    pub web_search: WebSearchConfig,

    /// Pipeline behavior
    pub pipeline: PipelineConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "openai".to_string(),
            ProviderConfig::OpenAI {
                api_key_env: "OPENAI_API_KEY".to_string(),
                model: "gpt-3.5-turbo".to_string(),
                endpoint: None,
            },
        );
        providers.insert(
            "ollama".to_string(),
            ProviderConfig::Ollama {
                endpoint: "http://localhost:11434".to_string(),
                model: "llama3.2".to_string(),
                timeout: Some(30),
            },
        );

        Self {
            active_provider: "openai".to_string(),
            providers,
        }
    }
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Custom endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenAI { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }
}

/// Document retriever service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieverConfig {
    #[serde(default = "default_retriever_endpoint")]
    pub endpoint: String,

    #[serde(rename = "timeoutSecs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            endpoint: default_retriever_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RetrieverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Web search service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    #[serde(default = "default_web_search_endpoint")]
    pub endpoint: String,

    /// Environment variable holding the search API key
    #[serde(rename = "apiKeyEnv", default = "default_web_search_key_env")]
    pub api_key_env: String,

    /// Number of snippets requested (top-k)
    #[serde(rename = "maxResults", default = "default_max_results")]
    pub max_results: usize,

    #[serde(rename = "timeoutSecs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_web_search_endpoint(),
            api_key_env: default_web_search_key_env(),
            max_results: default_max_results(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl WebSearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the search API key from the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }
}

/// How the relevance grader treats a failed per-document call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GradingPolicy {
    /// Drop only the document whose grading failed; keep the others' verdicts.
    #[default]
    Independent,
    /// The first failure discards the whole batch, including documents
    /// already graded relevant.
    AbortOnFailure,
}

impl GradingPolicy {
    /// Parse a policy name as written in config or on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "independent" => Some(Self::Independent),
            "abort-on-failure" | "abort" => Some(Self::AbortOnFailure),
            _ => None,
        }
    }
}

/// Pipeline behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Time budget for each language-model call
    #[serde(rename = "llmTimeoutSecs", default = "default_timeout_secs")]
    pub llm_timeout_secs: u64,

    #[serde(rename = "gradingPolicy", default)]
    pub grading_policy: GradingPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            llm_timeout_secs: default_timeout_secs(),
            grading_policy: GradingPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

fn default_retriever_endpoint() -> String {
    DEFAULT_RETRIEVER_ENDPOINT.to_string()
}

fn default_web_search_endpoint() -> String {
    DEFAULT_WEB_SEARCH_ENDPOINT.to_string()
}

fn default_web_search_key_env() -> String {
    "TAVILY_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_results() -> usize {
    3
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceSection>,
    logging: Option<LoggingSection>,
    retriever: Option<RetrieverConfig>,
    #[serde(rename = "webSearch")]
    web_search: Option<WebSearchConfig>,
    pipeline: Option<PipelineConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    format: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let llm = LlmConfig::default();
        let provider = llm.active_provider.clone();
        let model = llm
            .providers
            .get(&provider)
            .map(|p| p.model().to_string())
            .unwrap_or_else(|| "gpt-3.5-turbo".to_string());

        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider,
            model,
            api_key: None,
            log_level: None,
            log_format: "text".to_string(),
            verbose: false,
            no_color: false,
            llm,
            retriever: RetrieverConfig::default(),
            web_search: WebSearchConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file and the environment.
    ///
    /// Environment variables:
    /// - `TAXGPT_WORKSPACE`: Override workspace path
    /// - `TAXGPT_CONFIG`: Path to config file
    /// - `TAXGPT_PROVIDER`: LLM provider
    /// - `TAXGPT_MODEL`: Model identifier
    /// - `TAXGPT_API_KEY`: API key for the LLM provider
    /// - `TAXGPT_RETRIEVER_URL`: Document retriever endpoint
    /// - `TAXGPT_WEB_SEARCH_URL`: Web search endpoint
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use taxgpt_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Retriever: {}", config.retriever.endpoint);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_for(None)
    }

    /// Like [`AppConfig::load`], but an explicit workspace (the `--workspace`
    /// flag) wins over `TAXGPT_WORKSPACE`, so its `.taxgpt/config.yaml` is
    /// the one that gets read.
    pub fn load_for(workspace: Option<&Path>) -> AppResult<Self> {
        // Missing .env is fine
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace.to_path_buf();
        } else if let Ok(workspace) = std::env::var("TAXGPT_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("TAXGPT_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.taxgpt_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("TAXGPT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("TAXGPT_MODEL") {
            config.model = model;
        }

        if let Ok(url) = std::env::var("TAXGPT_RETRIEVER_URL") {
            config.retriever.endpoint = url;
        }

        if let Ok(url) = std::env::var("TAXGPT_WEB_SEARCH_URL") {
            config.web_search.endpoint = url;
        }

        config.api_key = std::env::var("TAXGPT_API_KEY").ok();
        if config.log_level.is_none() {
            config.log_level = std::env::var("RUST_LOG").ok();
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = llm;
        }

        if let Some(retriever) = config_file.retriever {
            result.retriever = retriever;
        }

        if let Some(web_search) = config_file.web_search {
            result.web_search = web_search;
        }

        if let Some(pipeline) = config_file.pipeline {
            result.pipeline = pipeline;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            // A provider switch without an explicit model picks that provider's model
            if model.is_none() {
                if let Some(pc) = self.llm.providers.get(&provider) {
                    self.model = pc.model().to_string();
                }
            }
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .taxgpt directory.
    pub fn taxgpt_dir(&self) -> PathBuf {
        self.workspace.join(".taxgpt")
    }

    /// Directory holding prompt overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.taxgpt_dir().join("prompts")
    }

    /// Get the configuration for a provider.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.providers.get(provider)
    }

    /// Resolve the LLM API key: explicit key first, then the provider's `apiKeyEnv`.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        match self.get_provider_config(provider)? {
            ProviderConfig::OpenAI { api_key_env, .. } => std::env::var(api_key_env).ok(),
            ProviderConfig::Ollama { .. } => None,
        }
    }

    /// Validate configuration for the active provider and collaborators.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["openai", "ollama"];

        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if let Some(ProviderConfig::OpenAI { api_key_env, .. }) =
            self.get_provider_config(&self.provider)
        {
            if self.api_key.is_none() && std::env::var(api_key_env).is_err() {
                return Err(AppError::Config(format!(
                    "API key not found in environment variable: {}",
                    api_key_env
                )));
            }
        }

        if self.retriever.endpoint.is_empty() {
            return Err(AppError::Config(
                "Retriever endpoint cannot be empty".to_string(),
            ));
        }

        if self.retriever.timeout_secs == 0
            || self.web_search.timeout_secs == 0
            || self.pipeline.llm_timeout_secs == 0
        {
            return Err(AppError::Config(
                "Timeouts must be at least one second".to_string(),
            ));
        }

        if self.web_search.max_results == 0 {
            return Err(AppError::Config(
                "webSearch.maxResults must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.retriever.endpoint, DEFAULT_RETRIEVER_ENDPOINT);
        assert_eq!(config.web_search.max_results, 3);
        assert_eq!(config.pipeline.grading_policy, GradingPolicy::Independent);
        assert!(!config.verbose);
    }

    #[test]
    fn test_taxgpt_dir() {
        let config = AppConfig::default();
        assert!(config.taxgpt_dir().ends_with(".taxgpt"));
        assert!(config.prompts_dir().ends_with(".taxgpt/prompts"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            None,
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_explicit_model_wins_over_provider_default() {
        let overridden = AppConfig::default().with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("mistral".to_string()),
            None,
            false,
            false,
        );
        assert_eq!(overridden.model, "mistral");
    }

    #[test]
    fn test_merge_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: "http://gpu-box:11434"
      model: qwen2.5
      timeout: 60
retriever:
  endpoint: "http://vector-db:5001/vector"
  timeoutSecs: 5
webSearch:
  endpoint: "http://search.local/search"
  apiKeyEnv: SEARCH_KEY
  maxResults: 5
pipeline:
  gradingPolicy: abort-on-failure
logging:
  level: debug
  format: json
"#
        )
        .unwrap();

        let config = AppConfig::default().merge_yaml(file.path()).unwrap();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "qwen2.5");
        assert_eq!(config.retriever.endpoint, "http://vector-db:5001/vector");
        assert_eq!(config.retriever.timeout(), Duration::from_secs(5));
        assert_eq!(config.web_search.api_key_env, "SEARCH_KEY");
        assert_eq!(config.web_search.max_results, 5);
        assert_eq!(config.web_search.timeout_secs, 30);
        assert_eq!(
            config.pipeline.grading_policy,
            GradingPolicy::AbortOnFailure
        );
        assert_eq!(config.pipeline.llm_timeout_secs, 30);
        assert_eq!(config.log_level, Some("debug".to_string()));
        assert_eq!(config.log_format, "json");
    }

    #[test]
    fn test_merge_yaml_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
retriever:
  timeoutSecs: 5
webSearch:
  maxResults: 5
"#
        )
        .unwrap();

        let config = AppConfig::default().merge_yaml(file.path()).unwrap();
        assert_eq!(config.retriever.endpoint, DEFAULT_RETRIEVER_ENDPOINT);
        assert_eq!(config.retriever.timeout_secs, 5);
        assert_eq!(config.web_search.endpoint, DEFAULT_WEB_SEARCH_ENDPOINT);
        assert_eq!(config.web_search.api_key_env, "TAVILY_API_KEY");
        assert_eq!(config.web_search.max_results, 5);
    }

    #[test]
    fn test_load_for_reads_workspace_config() {
        let workspace = tempfile::tempdir().unwrap();
        let taxgpt_dir = workspace.path().join(".taxgpt");
        std::fs::create_dir_all(&taxgpt_dir).unwrap();
        std::fs::write(
            taxgpt_dir.join("config.yaml"),
            "pipeline:\n  gradingPolicy: abort-on-failure\n  llmTimeoutSecs: 7\n",
        )
        .unwrap();

        let config = AppConfig::load_for(Some(workspace.path())).unwrap();
        assert_eq!(config.workspace, workspace.path());
        assert_eq!(
            config.pipeline.grading_policy,
            GradingPolicy::AbortOnFailure
        );
        assert_eq!(config.pipeline.llm_timeout_secs, 7);
    }

    #[test]
    fn test_load_for_missing_workspace() {
        let result = AppConfig::load_for(Some(Path::new("/nonexistent/taxgpt-workspace")));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_merge_yaml_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "retriever: [not, a, map]").unwrap();
        let result = AppConfig::default().merge_yaml(file.path());
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_grading_policy_parse() {
        assert_eq!(
            GradingPolicy::parse("independent"),
            Some(GradingPolicy::Independent)
        );
        assert_eq!(
            GradingPolicy::parse("abort-on-failure"),
            Some(GradingPolicy::AbortOnFailure)
        );
        assert_eq!(GradingPolicy::parse("sometimes"), None);
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_openai_with_explicit_key() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(config.resolve_api_key("openai"), Some("sk-test".to_string()));
    }

    #[test]
    fn test_validate_rejects_zero_results() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        config.web_search.max_results = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        config.pipeline.llm_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
