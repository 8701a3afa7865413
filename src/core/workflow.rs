use crate::domain::model::{RunEvent, RunOutcome, RunResponse, SearchOutcome};
use crate::domain::ports::{Extractor, Searcher};
use crate::utils::error::{Result, ScoutError};
use crate::utils::validation::validate_non_empty_string;
use std::fmt::Debug;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Label used in logs and session records, e.g. `find-item-listing`.
    pub name: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub session_id: Option<String>,
}

impl WorkflowSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::ZERO,
            session_id: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Chains a searcher and an extractor: retry the search until it yields a
/// usable result set, then extract the first result's page once.
pub struct Workflow<S: Searcher, E: Extractor> {
    searcher: S,
    extractor: E,
    settings: WorkflowSettings,
    not_found: Box<dyn Fn(&str) -> String + Send + Sync>,
}

impl<S: Searcher, E: Extractor> Workflow<S, E>
where
    E::Output: Debug,
{
    pub fn new(
        searcher: S,
        extractor: E,
        settings: WorkflowSettings,
        not_found: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            searcher,
            extractor,
            settings,
            not_found: Box::new(not_found),
        }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub async fn run(&self, query: &str) -> Result<RunResponse<E::Output>> {
        validate_non_empty_string("query", query).map_err(|_| ScoutError::ValidationError {
            message: "query cannot be empty".to_string(),
        })?;

        let run_id = uuid::Uuid::new_v4().to_string();
        tracing::info!("🔎 {}: fetching results for '{}' (run {})", self.settings.name, query, run_id);

        let mut attempts = 0;
        let mut source_url: Option<String> = None;

        while source_url.is_none() && attempts < self.settings.max_attempts {
            if attempts > 0 && !self.settings.retry_delay.is_zero() {
                tokio::time::sleep(self.settings.retry_delay).await;
            }
            attempts += 1;

            match self.searcher.search(query).await {
                Ok(SearchOutcome::Valid(set)) => match set.check() {
                    Ok(()) => {
                        tracing::info!(
                            "✅ {}: searcher found {} results on attempt {}",
                            self.settings.name,
                            set.items.len(),
                            attempts
                        );
                        source_url = set.first().map(|item| item.url.clone());
                    }
                    Err(reason) => {
                        tracing::warn!(
                            "⚠️ {}: searcher response invalid ({}), trying again...",
                            self.settings.name,
                            reason
                        );
                    }
                },
                Ok(SearchOutcome::Invalid(reason)) => {
                    tracing::warn!(
                        "⚠️ {}: searcher response invalid ({}), trying again...",
                        self.settings.name,
                        reason
                    );
                }
                Err(e) => {
                    tracing::warn!("⚠️ {}: error running searcher: {}", self.settings.name, e);
                }
            }
        }

        let Some(source_url) = source_url else {
            tracing::info!(
                "❌ {}: no usable search results after {} attempts",
                self.settings.name,
                attempts
            );
            return Ok(self.respond(
                run_id,
                attempts,
                RunOutcome::NotFound {
                    message: (self.not_found)(query),
                },
            ));
        };

        tracing::info!("🌐 {}: extracting details from {}", self.settings.name, source_url);

        let extraction = self.extractor.extract(&source_url).await.map_err(|e| match e {
            ScoutError::Extraction { .. } => e,
            other => ScoutError::Extraction {
                url: source_url.clone(),
                message: other.to_string(),
            },
        })?;
        tracing::debug!("{}: extractor response: {:?}", self.settings.name, extraction);

        Ok(self.respond(
            run_id,
            attempts,
            RunOutcome::Found {
                source_url,
                extraction,
            },
        ))
    }

    fn respond(
        &self,
        run_id: String,
        attempts: u32,
        outcome: RunOutcome<E::Output>,
    ) -> RunResponse<E::Output> {
        RunResponse {
            run_id,
            session_id: self.settings.session_id.clone(),
            event: RunEvent::WorkflowCompleted,
            attempts,
            created_at: chrono::Utc::now(),
            outcome,
        }
    }
}
