use crate::adapters::{DuckDuckGoSearch, GeminiClient, HttpPageFetcher, KnowledgeBase};
use crate::domain::ports::{ConfigProvider, LanguageModel, PageFetcher, WebSearch};
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;
use std::sync::Arc;

/// External capabilities shared by both pipelines. Built once at startup and
/// read-only afterwards.
#[derive(Clone)]
pub struct AgentServices {
    pub model: Arc<dyn LanguageModel>,
    pub web: Arc<dyn WebSearch>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub knowledge: Option<Arc<KnowledgeBase>>,
}

impl AgentServices {
    pub async fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let api_key = config.api_key();
        let api_key = validate_required_field("model.api_key (or GOOGLE_API_KEY)", &api_key)?;

        let model = GeminiClient::with_timeout(*api_key, config.model_name(), config.model_timeout())?
            .with_base_url(config.model_base_url());
        let web = DuckDuckGoSearch::new(config.search_timeout())?
            .with_base_url(config.search_base_url());
        let fetcher =
            HttpPageFetcher::new(config.page_timeout())?.with_max_length(config.page_max_length());

        let knowledge = match config.knowledge_base() {
            Some(source) => Some(Arc::new(KnowledgeBase::load(source).await?)),
            None => None,
        };

        tracing::debug!(
            "Services ready: model={}, search={}, knowledge_base={}",
            model.model(),
            config.search_base_url(),
            knowledge.as_ref().map(|kb| kb.source()).unwrap_or("none")
        );

        Ok(Self {
            model: Arc::new(model),
            web: Arc::new(web),
            fetcher: Arc::new(fetcher),
            knowledge,
        })
    }
}
