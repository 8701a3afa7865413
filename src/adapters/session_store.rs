use crate::domain::model::SessionRecord;
use crate::domain::ports::SessionStore;
use crate::utils::error::{Result, ScoutError};
use std::path::{Path, PathBuf};

/// Keeps one JSON file per session id under `base_path`.
#[derive(Debug, Clone)]
pub struct LocalSessionStore {
    base_path: PathBuf,
}

impl LocalSessionStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn record_path(&self, session_id: &str) -> PathBuf {
        let file_name: String = session_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Path::new(&self.base_path).join(format!("{}.json", file_name))
    }
}

impl SessionStore for LocalSessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let path = self.record_path(session_id);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record = serde_json::from_slice(&data).map_err(|e| ScoutError::StorageError {
            message: format!("corrupt session file {}: {}", path.display(), e),
        })?;
        Ok(Some(record))
    }

    async fn save(&self, record: &SessionRecord) -> Result<()> {
        let path = self.record_path(&record.session_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(&path, data).await?;
        tracing::debug!("Session {} saved to {}", record.session_id, path.display());
        Ok(())
    }
}
