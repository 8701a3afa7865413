pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::ScoutConfig;

pub use adapters::LocalSessionStore;
pub use app::{run_pipeline, AgentServices, PipelineKind, PipelineRun};
pub use crate::core::{session::SessionRunner, workflow::Workflow};
pub use utils::error::{Result, ScoutError};
