use crate::domain::model::{Extraction, SearchOutcome, SessionRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Finds candidate pages for a query.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// `Err` means the call itself failed; a malformed or empty answer is
    /// `Ok(SearchOutcome::Invalid(..))`.
    async fn search(&self, query: &str) -> Result<SearchOutcome>;
}

/// Reads one page and pulls structured records out of it.
#[async_trait]
pub trait Extractor: Send + Sync {
    type Output: Send;

    async fn extract(&self, url: &str) -> Result<Extraction<Self::Output>>;
}

#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub instructions: Vec<String>,
    pub prompt: String,
    pub response_schema: Option<serde_json::Value>,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the raw text of the first candidate answer. An answer the
    /// service blocked or left empty is `Ok` with an empty string; `Err` is
    /// reserved for transport and HTTP status failures.
    async fn generate(&self, request: &GenerateRequest) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PageContent>;
}

pub trait SessionStore: Send + Sync {
    fn load(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<SessionRecord>>> + Send;
    fn save(&self, record: &SessionRecord)
        -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Settings the pipelines and adapters read, independent of where they came from.
pub trait ConfigProvider: Send + Sync {
    fn model_name(&self) -> &str;
    fn model_base_url(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn model_timeout(&self) -> Duration;
    fn max_attempts(&self) -> u32;
    fn retry_delay(&self) -> Duration;
    fn search_base_url(&self) -> &str;
    fn search_timeout(&self) -> Duration;
    fn max_hits(&self) -> usize;
    fn max_results(&self) -> usize;
    fn page_timeout(&self) -> Duration;
    fn page_max_length(&self) -> Option<usize>;
    fn knowledge_base(&self) -> Option<&str>;
    fn knowledge_max_chars(&self) -> usize;
    fn session_dir(&self) -> &str;
    fn use_cache(&self) -> bool;
}
