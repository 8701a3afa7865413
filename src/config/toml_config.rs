use crate::adapters::duckduckgo::DUCKDUCKGO_URL;
use crate::adapters::gemini::{DEFAULT_MODEL, GEMINI_API_URL};
use crate::core::agents::{DEFAULT_KNOWLEDGE_CHARS, DEFAULT_MAX_HITS, DEFAULT_MAX_RESULTS};
use crate::core::workflow::DEFAULT_MAX_ATTEMPTS;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, ScoutError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub workflow: WorkflowConfig,
    pub model: ModelConfig,
    pub search: SearchConfig,
    pub extract: ExtractConfig,
    pub knowledge_base: Option<KnowledgeBaseConfig>,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub use_cache: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: 0,
            use_cache: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_API_URL.to_string(),
            api_key: None,
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    pub max_hits: usize,
    pub max_results: usize,
    pub timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: DUCKDUCKGO_URL.to_string(),
            max_hits: DEFAULT_MAX_HITS,
            max_results: DEFAULT_MAX_RESULTS,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Page text cap in characters; unset keeps the whole page.
    pub max_length: Option<usize>,
    pub timeout_seconds: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_length: None,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Local path or http(s) URL of the document.
    pub source: String,
    #[serde(default = "default_knowledge_chars")]
    pub max_chars: usize,
}

fn default_knowledge_chars() -> usize {
    DEFAULT_KNOWLEDGE_CHARS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub session_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            session_dir: "./tmp/sessions".to_string(),
        }
    }
}

impl ScoutConfig {
    /// Loads a config file, substituting `${VAR}` references from the environment.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScoutError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML text; missing sections fall back to their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: Self =
            toml::from_str(&processed_content).map_err(|e| ScoutError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        // an unresolved ${VAR} means the variable was not set
        if config
            .model
            .api_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty() || key.contains("${"))
        {
            config.model.api_key = None;
        }
        Ok(config)
    }

    /// Replaces `${VAR}` with the variable value, leaving unset ones untouched.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ScoutError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Falls back to `GOOGLE_API_KEY` when the file does not set `model.api_key`.
    pub fn with_env_api_key(mut self) -> Self {
        if self.model.api_key.is_none() {
            self.model.api_key = std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
        self
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("model.base_url", &self.model.base_url)?;
        validation::validate_non_empty_string("model.name", &self.model.name)?;
        validation::validate_range("model.timeout_seconds", self.model.timeout_seconds, 1, 600)?;

        validation::validate_range("workflow.max_attempts", self.workflow.max_attempts, 1, 10)?;
        validation::validate_range("workflow.retry_delay_ms", self.workflow.retry_delay_ms, 0, 60_000)?;

        validation::validate_url("search.base_url", &self.search.base_url)?;
        validation::validate_range("search.max_results", self.search.max_results, 1, 10)?;
        validation::validate_range("search.max_hits", self.search.max_hits, 1, 50)?;
        validation::validate_range("search.timeout_seconds", self.search.timeout_seconds, 1, 300)?;
        if self.search.max_hits < self.search.max_results {
            return Err(ScoutError::InvalidConfigValueError {
                field: "search.max_hits".to_string(),
                value: self.search.max_hits.to_string(),
                reason: format!(
                    "must be at least search.max_results ({})",
                    self.search.max_results
                ),
            });
        }

        validation::validate_range("extract.timeout_seconds", self.extract.timeout_seconds, 1, 300)?;
        if let Some(max_length) = self.extract.max_length {
            validation::validate_range("extract.max_length", max_length, 100, 1_000_000)?;
        }

        if let Some(kb) = &self.knowledge_base {
            validation::validate_path("knowledge_base.source", &kb.source)?;
            validation::validate_range("knowledge_base.max_chars", kb.max_chars, 100, 200_000)?;
        }

        validation::validate_path("storage.session_dir", &self.storage.session_dir)?;
        Ok(())
    }
}

impl ConfigProvider for ScoutConfig {
    fn model_name(&self) -> &str {
        &self.model.name
    }

    fn model_base_url(&self) -> &str {
        &self.model.base_url
    }

    fn api_key(&self) -> Option<&str> {
        self.model.api_key.as_deref()
    }

    fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model.timeout_seconds)
    }

    fn max_attempts(&self) -> u32 {
        self.workflow.max_attempts
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.workflow.retry_delay_ms)
    }

    fn search_base_url(&self) -> &str {
        &self.search.base_url
    }

    fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search.timeout_seconds)
    }

    fn max_hits(&self) -> usize {
        self.search.max_hits
    }

    fn max_results(&self) -> usize {
        self.search.max_results
    }

    fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.extract.timeout_seconds)
    }

    fn page_max_length(&self) -> Option<usize> {
        self.extract.max_length
    }

    fn knowledge_base(&self) -> Option<&str> {
        self.knowledge_base.as_ref().map(|kb| kb.source.as_str())
    }

    fn knowledge_max_chars(&self) -> usize {
        self.knowledge_base
            .as_ref()
            .map(|kb| kb.max_chars)
            .unwrap_or(DEFAULT_KNOWLEDGE_CHARS)
    }

    fn session_dir(&self) -> &str {
        &self.storage.session_dir
    }

    fn use_cache(&self) -> bool {
        self.workflow.use_cache
    }
}

impl Validate for ScoutConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

/// Loads a `.env` file into the process environment: `path` when given,
/// otherwise the nearest `.env` upwards from the working directory. A missing
/// file is `Ok(None)`; an unreadable or malformed one is an error.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|_| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(ScoutError::ConfigError {
            message: format!("invalid .env file: {}", e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_env_file_is_ignored() {
        let dir = tempfile::TempDir::new().unwrap();
        let loaded = load_env_file(Some(&dir.path().join(".env"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_env_file_values_are_loaded() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"LISTING_SCOUT_TEST_DOTENV=loaded\n").unwrap();

        let loaded = load_env_file(Some(file.path())).unwrap();

        assert_eq!(loaded.as_deref(), Some(file.path()));
        assert_eq!(std::env::var("LISTING_SCOUT_TEST_DOTENV").unwrap(), "loaded");
    }

    #[test]
    fn test_malformed_env_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"NOT A VALID LINE\n").unwrap();

        let err = load_env_file(Some(file.path())).unwrap_err();

        assert!(matches!(err, ScoutError::ConfigError { .. }));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = ScoutConfig::from_toml_str("").unwrap();

        assert_eq!(config.max_attempts(), 3);
        assert_eq!(config.model_name(), "gemini-2.0-flash-exp");
        assert_eq!(config.search_base_url(), "https://html.duckduckgo.com");
        assert_eq!(config.max_results(), 3);
        assert!(config.page_max_length().is_none());
        assert!(config.knowledge_base().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[workflow]
max_attempts = 5
retry_delay_ms = 250
use_cache = true

[model]
name = "gemini-1.5-pro"
timeout_seconds = 60

[search]
max_hits = 8
max_results = 2

[extract]
max_length = 20000

[knowledge_base]
source = "./resume.md"

[storage]
session_dir = "./sessions"
"#;

        let config = ScoutConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.max_attempts(), 5);
        assert_eq!(config.retry_delay(), Duration::from_millis(250));
        assert!(config.use_cache());
        assert_eq!(config.model_name(), "gemini-1.5-pro");
        assert_eq!(config.max_hits(), 8);
        assert_eq!(config.page_max_length(), Some(20000));
        assert_eq!(config.knowledge_base(), Some("./resume.md"));
        assert_eq!(config.knowledge_max_chars(), DEFAULT_KNOWLEDGE_CHARS);
        assert_eq!(config.session_dir(), "./sessions");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("LISTING_SCOUT_TEST_KEY", "secret-123");

        let toml_content = r#"
[model]
api_key = "${LISTING_SCOUT_TEST_KEY}"
"#;

        let config = ScoutConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api_key(), Some("secret-123"));

        std::env::remove_var("LISTING_SCOUT_TEST_KEY");
    }

    #[test]
    fn test_unresolved_api_key_is_treated_as_missing() {
        let toml_content = r#"
[model]
api_key = "${LISTING_SCOUT_UNSET_VARIABLE}"
"#;

        let config = ScoutConfig::from_toml_str(toml_content).unwrap();
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_config_validation() {
        let config = ScoutConfig::from_toml_str("[workflow]\nmax_attempts = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = ScoutConfig::from_toml_str("[search]\nbase_url = \"invalid-url\"\n").unwrap();
        assert!(config.validate().is_err());

        let config =
            ScoutConfig::from_toml_str("[search]\nmax_hits = 2\nmax_results = 3\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ScoutConfig::from_toml_str("[workflow\nmax_attempts = 3").unwrap_err();
        assert!(matches!(err, ScoutError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[storage]\nsession_dir = \"./file-sessions\"\n")
            .unwrap();

        let config = ScoutConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.session_dir(), "./file-sessions");
    }
}
