use crate::core::workflow::Workflow;
use crate::domain::model::{RunResponse, SessionRecord};
use crate::domain::ports::{Extractor, Searcher, SessionStore};
use crate::utils::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Runs a workflow under a session id: optionally answers from the stored
/// session, and records every completed run.
pub struct SessionRunner<'a, St: SessionStore> {
    store: &'a St,
    use_cache: bool,
}

impl<'a, St: SessionStore> SessionRunner<'a, St> {
    pub fn new(store: &'a St, use_cache: bool) -> Self {
        Self { store, use_cache }
    }

    pub async fn run<S, E>(
        &self,
        workflow: &Workflow<S, E>,
        query: &str,
    ) -> Result<RunResponse<E::Output>>
    where
        S: Searcher,
        E: Extractor,
        E::Output: Serialize + DeserializeOwned + Debug,
    {
        let settings = workflow.settings();
        let Some(session_id) = settings.session_id.as_deref() else {
            return workflow.run(query).await;
        };

        if self.use_cache {
            if let Some(cached) = self.cached::<E::Output>(session_id, &settings.name, query).await {
                tracing::info!("💾 {}: found cached result in session {}", settings.name, session_id);
                return Ok(cached);
            }
        }

        let response = workflow.run(query).await?;

        let record = SessionRecord {
            session_id: session_id.to_string(),
            pipeline: settings.name.clone(),
            query: query.to_string(),
            updated_at: chrono::Utc::now(),
            response: serde_json::to_value(&response)?,
        };
        // the session log is best-effort; a failed write never fails the run
        if let Err(e) = self.store.save(&record).await {
            tracing::warn!("⚠️ Could not save session {}: {}", session_id, e);
        }

        Ok(response)
    }

    async fn cached<T: DeserializeOwned>(
        &self,
        session_id: &str,
        pipeline: &str,
        query: &str,
    ) -> Option<RunResponse<T>> {
        let record = match self.store.load(session_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("⚠️ Could not read session {}: {}", session_id, e);
                return None;
            }
        };

        if record.pipeline != pipeline || record.query != query {
            tracing::debug!("Session {} holds a different query, ignoring cache", session_id);
            return None;
        }

        match serde_json::from_value::<RunResponse<T>>(record.response) {
            Ok(response) if response.is_found() => Some(response),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("⚠️ Stored session {} has an unexpected shape: {}", session_id, e);
                None
            }
        }
    }
}
