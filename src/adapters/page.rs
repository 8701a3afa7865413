use crate::domain::ports::{PageContent, PageFetcher};
use crate::utils::error::{Result, ScoutError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const MAIN_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role='main']",
    "#content",
    "#main",
    ".content",
    ".product",
    ".job-description",
    "body",
];

const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "svg", "nav", "header", "footer", "aside", "form",
];

/// Fetches a page over HTTP and reduces it to readable text.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
    max_length: Option<usize>,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-CA,en;q=0.8"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            max_length: None,
        })
    }

    /// Caps the returned text at `max_length` characters; `None` keeps everything.
    pub fn with_max_length(mut self, max_length: Option<usize>) -> Self {
        self.max_length = max_length;
        self
    }

    fn extract_title(document: &Html) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    fn main_region(document: &Html) -> Option<ElementRef<'_>> {
        MAIN_SELECTORS.iter().find_map(|s| {
            let selector = Selector::parse(s).ok()?;
            document.select(&selector).next()
        })
    }

    fn readable_text(root: ElementRef<'_>) -> String {
        let mut lines = Vec::new();
        for node in root.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            // only tags inside the selected region count; pages often wrap
            // everything in a <form>
            let skipped = node
                .ancestors()
                .take_while(|ancestor| ancestor.id() != root.id())
                .any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .is_some_and(|el| SKIPPED_TAGS.contains(&el.name()))
                });
            if skipped {
                continue;
            }
            let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines.join("\n")
    }

    pub(crate) fn html_to_page(&self, url: &str, html: &str) -> PageContent {
        let document = Html::parse_document(html);
        let title = Self::extract_title(&document);
        let mut text = Self::main_region(&document)
            .map(Self::readable_text)
            .unwrap_or_default();

        if let Some(limit) = self.max_length {
            if let Some((cut, _)) = text.char_indices().nth(limit) {
                text.truncate(cut);
            }
        }

        PageContent {
            url: url.to_string(),
            title,
            text,
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<PageContent> {
        tracing::debug!("Fetching page: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::Extraction {
                url: url.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let html = response.text().await?;
        let page = self.html_to_page(url, &html);
        if page.text.trim().len() < 100 {
            tracing::warn!("Page has minimal content: {}", url);
        }
        Ok(page)
    }
}
