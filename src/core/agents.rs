use crate::adapters::knowledge_base::KnowledgeBase;
use crate::adapters::schema::{parse_structured, StructuredOutput};
use crate::domain::model::{Extraction, SearchOutcome, SearchResultSet};
use crate::domain::ports::{
    Extractor, GenerateRequest, LanguageModel, PageFetcher, SearchHit, Searcher, WebSearch,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::fmt::Write as _;
use std::marker::PhantomData;
use std::sync::Arc;

pub const DEFAULT_MAX_HITS: usize = 10;
pub const DEFAULT_MAX_RESULTS: usize = 3;
pub const DEFAULT_KNOWLEDGE_CHARS: usize = 8_000;

/// Searcher that runs a web search and lets the language model pick the best
/// candidates as a [`SearchResultSet`].
pub struct LlmSearcher {
    model: Arc<dyn LanguageModel>,
    web: Arc<dyn WebSearch>,
    instructions: Vec<String>,
    max_hits: usize,
    max_results: usize,
    knowledge: Option<(Arc<KnowledgeBase>, usize)>,
}

impl LlmSearcher {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        web: Arc<dyn WebSearch>,
        instructions: Vec<String>,
    ) -> Self {
        Self {
            model,
            web,
            instructions,
            max_hits: DEFAULT_MAX_HITS,
            max_results: DEFAULT_MAX_RESULTS,
            knowledge: None,
        }
    }

    pub fn with_limits(mut self, max_hits: usize, max_results: usize) -> Self {
        self.max_hits = max_hits.max(1);
        self.max_results = max_results.max(1);
        self
    }

    pub fn with_knowledge_base(mut self, knowledge: Arc<KnowledgeBase>, max_chars: usize) -> Self {
        self.knowledge = Some((knowledge, max_chars));
        self
    }

    fn build_prompt(&self, query: &str, hits: &[SearchHit]) -> String {
        let mut prompt = format!("Query: {}\n\n", query);

        if let Some((kb, max_chars)) = &self.knowledge {
            let _ = writeln!(prompt, "Reference document ({}):", kb.source());
            let _ = writeln!(prompt, "{}\n", kb.excerpt(*max_chars));
        }

        prompt.push_str("Web search results:\n");
        for (i, hit) in hits.iter().enumerate() {
            let _ = writeln!(prompt, "{}. {}\n   URL: {}", i + 1, hit.title, hit.url);
            if !hit.snippet.is_empty() {
                let _ = writeln!(prompt, "   {}", hit.snippet);
            }
        }

        let _ = write!(
            prompt,
            "\nReturn at most {} results as JSON. Only use URLs that appear in the search results above.",
            self.max_results
        );
        prompt
    }
}

#[async_trait]
impl Searcher for LlmSearcher {
    async fn search(&self, query: &str) -> Result<SearchOutcome> {
        let hits = self.web.search(query, self.max_hits).await?;
        if hits.is_empty() {
            return Ok(SearchOutcome::Invalid("web search returned no hits".to_string()));
        }

        let request = GenerateRequest {
            instructions: self.instructions.clone(),
            prompt: self.build_prompt(query, &hits),
            response_schema: Some(SearchResultSet::response_schema()),
        };
        let raw = self.model.generate(&request).await?;

        match parse_structured::<SearchResultSet>(&raw) {
            Ok(mut set) => {
                set.items.truncate(self.max_results);
                Ok(SearchOutcome::from_set(set))
            }
            Err(e) => Ok(SearchOutcome::Invalid(format!("unstructured searcher response: {}", e))),
        }
    }
}

/// Extractor that fetches a page and asks the language model to fill `T`.
pub struct LlmExtractor<T> {
    model: Arc<dyn LanguageModel>,
    fetcher: Arc<dyn PageFetcher>,
    instructions: Vec<String>,
    _output: PhantomData<fn() -> T>,
}

impl<T> LlmExtractor<T> {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        fetcher: Arc<dyn PageFetcher>,
        instructions: Vec<String>,
    ) -> Self {
        Self {
            model,
            fetcher,
            instructions,
            _output: PhantomData,
        }
    }
}

#[async_trait]
impl<T> Extractor for LlmExtractor<T>
where
    T: StructuredOutput + Send + 'static,
{
    type Output = T;

    async fn extract(&self, url: &str) -> Result<Extraction<T>> {
        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Could not read {}: {}", url, e);
                return Ok(Extraction::Empty {
                    reason: format!("page unavailable: {}", e),
                });
            }
        };

        if page.text.trim().is_empty() {
            return Ok(Extraction::Empty {
                reason: "page has no readable content".to_string(),
            });
        }

        let mut prompt = format!("Page URL: {}\n", page.url);
        if let Some(title) = &page.title {
            let _ = writeln!(prompt, "Page title: {}", title);
        }
        let _ = write!(prompt, "\nPage content:\n{}", page.text);

        let request = GenerateRequest {
            instructions: self.instructions.clone(),
            prompt,
            response_schema: Some(T::response_schema()),
        };
        let raw = self.model.generate(&request).await?;
        if raw.trim().is_empty() {
            tracing::warn!("Extractor model returned no content for {}", url);
            return Ok(Extraction::Empty {
                reason: "model returned no content".to_string(),
            });
        }

        Ok(match parse_structured::<T>(&raw) {
            Ok(record) => Extraction::Record { record },
            Err(e) => {
                tracing::warn!("Extractor returned unstructured output for {}: {}", url, e);
                Extraction::Empty {
                    reason: format!("unstructured extractor response: {}", e),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ItemListing;
    use crate::domain::ports::PageContent;
    use crate::utils::error::ScoutError;
    use std::sync::Mutex;

    struct CannedModel {
        answer: std::result::Result<String, String>,
        requests: Mutex<Vec<GenerateRequest>>,
    }

    impl CannedModel {
        fn answering(answer: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(answer.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                answer: Err("quota exceeded".to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.requests.lock().unwrap().iter().map(|r| r.prompt.clone()).collect()
        }
    }

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn generate(&self, request: &GenerateRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            self.answer
                .clone()
                .map_err(|message| ScoutError::ModelError { message })
        }
    }

    struct FixedWeb(Vec<SearchHit>);

    #[async_trait]
    impl WebSearch for FixedWeb {
        async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
            Ok(self.0.iter().take(max_results).cloned().collect())
        }
    }

    struct FixedPage(Option<&'static str>);

    #[async_trait]
    impl PageFetcher for FixedPage {
        async fn fetch(&self, url: &str) -> Result<PageContent> {
            match self.0 {
                Some(text) => Ok(PageContent {
                    url: url.to_string(),
                    title: Some("Shop".to_string()),
                    text: text.to_string(),
                }),
                None => Err(ScoutError::Extraction {
                    url: url.to_string(),
                    message: "HTTP 404".to_string(),
                }),
            }
        }
    }

    fn hit(url: &str) -> SearchHit {
        SearchHit {
            title: "Galaxy S25".to_string(),
            url: url.to_string(),
            snippet: "In stock".to_string(),
        }
    }

    #[tokio::test]
    async fn test_searcher_parses_structured_answer() {
        let model = CannedModel::answering(
            r#"{"items":[{"url":"https://a.ca/1"},{"url":"https://b.ca/2"},{"url":"https://c.ca/3"},{"url":"https://d.ca/4"}]}"#,
        );
        let web = Arc::new(FixedWeb(vec![hit("https://a.ca/1"), hit("https://b.ca/2")]));
        let searcher = LlmSearcher::new(model.clone(), web, vec!["find shops".to_string()]);

        let outcome = searcher.search("Samsung S25").await.unwrap();

        let SearchOutcome::Valid(set) = outcome else {
            panic!("expected a valid outcome");
        };
        assert_eq!(set.items.len(), 3);
        assert_eq!(set.items[0].url, "https://a.ca/1");
        let prompt = &model.prompts()[0];
        assert!(prompt.contains("Query: Samsung S25"));
        assert!(prompt.contains("URL: https://b.ca/2"));
    }

    #[tokio::test]
    async fn test_searcher_unstructured_answer_is_invalid() {
        let model = CannedModel::answering("Here are some great shops for you!");
        let web = Arc::new(FixedWeb(vec![hit("https://a.ca/1")]));
        let searcher = LlmSearcher::new(model, web, vec![]);

        let outcome = searcher.search("Samsung S25").await.unwrap();

        assert!(matches!(outcome, SearchOutcome::Invalid(_)));
    }

    #[tokio::test]
    async fn test_searcher_without_hits_skips_model() {
        let model = CannedModel::answering(r#"{"items":[{"url":"https://a.ca/1"}]}"#);
        let searcher = LlmSearcher::new(model.clone(), Arc::new(FixedWeb(vec![])), vec![]);

        let outcome = searcher.search("Samsung S25").await.unwrap();

        assert!(matches!(outcome, SearchOutcome::Invalid(_)));
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_searcher_includes_knowledge_base_excerpt() {
        let model = CannedModel::answering(r#"{"items":[{"url":"https://jobs.ca/1"}]}"#);
        let web = Arc::new(FixedWeb(vec![hit("https://jobs.ca/1")]));
        let kb = Arc::new(KnowledgeBase::from_text("resume.md", "Rust engineer with Kafka"));
        let searcher = LlmSearcher::new(model.clone(), web, vec![]).with_knowledge_base(kb, 4);

        searcher.search("backend jobs").await.unwrap();

        let prompt = &model.prompts()[0];
        assert!(prompt.contains("Reference document (resume.md):\nRust\n"));
        assert!(!prompt.contains("Kafka"));
    }

    #[tokio::test]
    async fn test_searcher_model_failure_is_an_error() {
        let web = Arc::new(FixedWeb(vec![hit("https://a.ca/1")]));
        let searcher = LlmSearcher::new(CannedModel::failing(), web, vec![]);

        assert!(searcher.search("Samsung S25").await.is_err());
    }

    #[tokio::test]
    async fn test_extractor_returns_record() {
        let model = CannedModel::answering(
            r#"{"name":"Galaxy S25","price":"1099.99","brand":"Samsung","stock":"In stock","description":"Phone","url":"https://a.ca/1"}"#,
        );
        let extractor: LlmExtractor<ItemListing> = LlmExtractor::new(
            model.clone(),
            Arc::new(FixedPage(Some("Galaxy S25 $1,099.99"))),
            vec!["extract".to_string()],
        );

        let extraction = extractor.extract("https://a.ca/1").await.unwrap();

        assert_eq!(extraction.record().unwrap().brand, "Samsung");
        assert!(model.prompts()[0].contains("Page content:\nGalaxy S25 $1,099.99"));
    }

    #[tokio::test]
    async fn test_extractor_unreachable_page_is_empty() {
        let model = CannedModel::answering("{}");
        let extractor: LlmExtractor<ItemListing> =
            LlmExtractor::new(model.clone(), Arc::new(FixedPage(None)), vec![]);

        let extraction = extractor.extract("https://a.ca/1").await.unwrap();

        assert!(matches!(extraction, Extraction::Empty { .. }));
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_extractor_unparseable_answer_is_empty() {
        let extractor: LlmExtractor<ItemListing> = LlmExtractor::new(
            CannedModel::answering("The phone costs about a thousand dollars."),
            Arc::new(FixedPage(Some("Galaxy S25"))),
            vec![],
        );

        let extraction = extractor.extract("https://a.ca/1").await.unwrap();

        assert!(matches!(extraction, Extraction::Empty { .. }));
    }

    #[tokio::test]
    async fn test_extractor_empty_answer_is_empty_extraction() {
        let extractor: LlmExtractor<ItemListing> = LlmExtractor::new(
            CannedModel::answering(""),
            Arc::new(FixedPage(Some("Galaxy S25"))),
            vec![],
        );

        let extraction = extractor.extract("https://a.ca/1").await.unwrap();

        assert_eq!(
            extraction,
            Extraction::Empty {
                reason: "model returned no content".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_extractor_model_failure_is_an_error() {
        let extractor: LlmExtractor<ItemListing> = LlmExtractor::new(
            CannedModel::failing(),
            Arc::new(FixedPage(Some("Galaxy S25"))),
            vec![],
        );

        let err = extractor.extract("https://a.ca/1").await.unwrap_err();
        assert!(matches!(err, ScoutError::ModelError { .. }));
    }
}
