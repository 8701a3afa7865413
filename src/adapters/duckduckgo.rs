use crate::domain::ports::{SearchHit, WebSearch};
use crate::utils::error::{Result, ScoutError};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

pub const DUCKDUCKGO_URL: &str = "https://html.duckduckgo.com";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Web search over DuckDuckGo's HTML endpoint.
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    base_url: String,
    client: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            base_url: DUCKDUCKGO_URL.to_string(),
            client,
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
        let document = Html::parse_document(html);
        let (Ok(result_sel), Ok(link_sel), Ok(snippet_sel)) = (
            Selector::parse(".result"),
            Selector::parse("a.result__a"),
            Selector::parse(".result__snippet"),
        ) else {
            return Vec::new();
        };

        let mut hits = Vec::new();
        for result in document.select(&result_sel) {
            let Some(link) = result.select(&link_sel).next() else {
                continue;
            };
            let Some(url) = link.value().attr("href").and_then(resolve_href) else {
                continue;
            };
            let title = collapse_whitespace(&link.text().collect::<String>());
            let snippet = result
                .select(&snippet_sel)
                .next()
                .map(|s| collapse_whitespace(&s.text().collect::<String>()))
                .unwrap_or_default();

            hits.push(SearchHit {
                title,
                url,
                snippet,
            });
            if hits.len() >= max_results {
                break;
            }
        }
        hits
    }
}

/// Turns a result href into the target URL, unwrapping `/l/?uddg=` redirects.
fn resolve_href(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{}", href)
    } else {
        href.to_string()
    };

    let url = Url::parse(&absolute).ok()?;
    if url.path().starts_with("/l/") {
        return url
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned());
    }
    match url.scheme() {
        "http" | "https" => Some(url.to_string()),
        _ => None,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl WebSearch for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let url = format!("{}/html/", self.base_url);
        tracing::debug!("Searching DuckDuckGo for: {}", query);

        let response = self.client.get(&url).query(&[("q", query)]).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::SearchError {
                message: format!("DuckDuckGo returned HTTP {}", status),
            });
        }

        let html = response.text().await?;
        let hits = Self::parse_results(&html, max_results);
        tracing::debug!("DuckDuckGo returned {} hits", hits.len());
        Ok(hits)
    }
}
