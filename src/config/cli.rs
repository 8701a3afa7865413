use crate::app::pipelines::PipelineKind;
use crate::config::toml_config::{KnowledgeBaseConfig, ScoutConfig};
use crate::core::agents::DEFAULT_KNOWLEDGE_CHARS;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "listing-scout")]
#[command(about = "Find product listings or job postings with a search agent and a page extraction agent")]
pub struct CliConfig {
    /// Which pipeline to run
    #[arg(long, value_enum, default_value_t = PipelineKind::Items)]
    pub pipeline: PipelineKind,

    /// Item name (items) or job search phrase (jobs)
    pub query: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Session id used to record the run (defaults to one derived from the query)
    #[arg(long)]
    pub session_id: Option<String>,

    #[arg(long, help = "Maximum search attempts before giving up")]
    pub max_attempts: Option<u32>,

    #[arg(long, help = "Gemini model id")]
    pub model: Option<String>,

    #[arg(long, help = "Reference document (path or URL) for the jobs pipeline")]
    pub knowledge_base: Option<String>,

    #[arg(long, help = "Directory for session records")]
    pub session_dir: Option<String>,

    #[arg(long, help = "Reuse a stored result for the same session and query")]
    pub use_cache: bool,

    #[arg(long, help = "Print the full run response as JSON")]
    pub json: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Loads `--config` (or defaults) and lays the command line flags over it.
    pub fn load_config(&self) -> Result<ScoutConfig> {
        let config = match &self.config {
            Some(path) => ScoutConfig::from_file(path)?,
            None => ScoutConfig::default(),
        };
        Ok(self.apply_overrides(config).with_env_api_key())
    }

    pub fn apply_overrides(&self, mut config: ScoutConfig) -> ScoutConfig {
        if let Some(max_attempts) = self.max_attempts {
            config.workflow.max_attempts = max_attempts;
        }
        if let Some(model) = &self.model {
            config.model.name = model.clone();
        }
        if let Some(source) = &self.knowledge_base {
            let max_chars = config
                .knowledge_base
                .as_ref()
                .map(|kb| kb.max_chars)
                .unwrap_or(DEFAULT_KNOWLEDGE_CHARS);
            config.knowledge_base = Some(KnowledgeBaseConfig {
                source: source.clone(),
                max_chars,
            });
        }
        if let Some(session_dir) = &self.session_dir {
            config.storage.session_dir = session_dir.clone();
        }
        if self.use_cache {
            config.workflow.use_cache = true;
        }
        config
    }
}
