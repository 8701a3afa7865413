pub mod item_listing;
pub mod job_search;

use crate::app::report::Render;
use crate::app::services::AgentServices;
use crate::domain::model::{ItemListing, JobPostings, RunResponse};
use crate::domain::ports::{ConfigProvider, SessionStore};
use crate::core::session::SessionRunner;
use crate::utils::error::{Result, ScoutError};

pub const DEFAULT_JOB_QUERY: &str = "job postings";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum PipelineKind {
    /// Product listings for an item name
    Items,
    /// Job postings matching the knowledge base
    Jobs,
}

impl PipelineKind {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineKind::Items => item_listing::NAME,
            PipelineKind::Jobs => job_search::NAME,
        }
    }

    /// The item pipeline needs an item name; the job pipeline falls back to a
    /// generic phrase and relies on the knowledge base.
    pub fn resolve_query(&self, query: Option<&str>) -> Result<String> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        match (self, query) {
            (_, Some(q)) => Ok(q.to_string()),
            (PipelineKind::Items, None) => Err(ScoutError::ValidationError {
                message: "an item name is required for the items pipeline".to_string(),
            }),
            (PipelineKind::Jobs, None) => Ok(DEFAULT_JOB_QUERY.to_string()),
        }
    }

    pub fn default_session_id(&self, query: &str) -> String {
        let mut slug = String::new();
        for c in query.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.ends_with('-') && !slug.is_empty() {
                slug.push('-');
            }
        }
        let slug = slug.trim_end_matches('-');
        if slug.is_empty() {
            self.name().to_string()
        } else {
            format!("{}-on-{}", self.name(), slug)
        }
    }
}

/// Finished run of either pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineRun {
    Items(RunResponse<ItemListing>),
    Jobs(RunResponse<JobPostings>),
}

impl PipelineRun {
    pub fn is_found(&self) -> bool {
        match self {
            PipelineRun::Items(r) => r.is_found(),
            PipelineRun::Jobs(r) => r.is_found(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(match self {
            PipelineRun::Items(r) => serde_json::to_string_pretty(r)?,
            PipelineRun::Jobs(r) => serde_json::to_string_pretty(r)?,
        })
    }

    pub fn render(&self) -> String {
        match self {
            PipelineRun::Items(r) => r.render(),
            PipelineRun::Jobs(r) => r.render(),
        }
    }
}

/// Builds the selected pipeline and runs it under `session_id`.
pub async fn run_pipeline<C: ConfigProvider, St: SessionStore>(
    kind: PipelineKind,
    query: &str,
    session_id: &str,
    services: &AgentServices,
    config: &C,
    store: &St,
) -> Result<PipelineRun> {
    let runner = SessionRunner::new(store, config.use_cache());
    match kind {
        PipelineKind::Items => {
            let workflow = item_listing::build(services, config, session_id);
            Ok(PipelineRun::Items(runner.run(&workflow, query).await?))
        }
        PipelineKind::Jobs => {
            let workflow = job_search::build(services, config, session_id);
            Ok(PipelineRun::Jobs(runner.run(&workflow, query).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_query() {
        assert_eq!(
            PipelineKind::Items.resolve_query(Some("  Samsung S25 ")).unwrap(),
            "Samsung S25"
        );
        assert!(PipelineKind::Items.resolve_query(None).is_err());
        assert!(PipelineKind::Items.resolve_query(Some("  ")).is_err());
        assert_eq!(PipelineKind::Jobs.resolve_query(None).unwrap(), DEFAULT_JOB_QUERY);
    }

    #[test]
    fn test_default_session_id() {
        assert_eq!(
            PipelineKind::Items.default_session_id("Samsung S25 (256GB)"),
            "find-item-listing-on-samsung-s25-256gb"
        );
        assert_eq!(PipelineKind::Jobs.default_session_id("!!!"), "find-job-postings");
    }
}
