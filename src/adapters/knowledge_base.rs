use crate::utils::error::{Result, ScoutError};
use crate::utils::validation::parse_web_url;
use std::path::Path;

/// A reference document (e.g. a résumé) loaded once at startup and handed to
/// searchers as read-only prompt context.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBase {
    source: String,
    content: String,
}

impl KnowledgeBase {
    pub fn from_text(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }

    /// Loads from an `http(s)` URL or a local file. PDFs are converted to
    /// text; other documents must be UTF-8 text (plain, markdown, html, json).
    pub async fn load(source: &str) -> Result<Self> {
        let content = if parse_web_url(source).is_ok() {
            Self::fetch_remote(source).await?
        } else {
            let bytes = tokio::fs::read(Path::new(source)).await?;
            if url_looks_like_pdf(source) || bytes_look_like_pdf(&bytes) {
                pdf_to_text(source, bytes).await?
            } else {
                utf8_text(source, bytes)?
            }
        };

        if content.trim().is_empty() {
            return Err(ScoutError::ConfigError {
                message: format!("knowledge base {} is empty", source),
            });
        }

        tracing::info!("📚 Loaded knowledge base from {} ({} chars)", source, content.len());
        Ok(Self::from_text(source, content))
    }

    async fn fetch_remote(source: &str) -> Result<String> {
        let response = reqwest::get(source).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::ConfigError {
                message: format!("knowledge base {} returned HTTP {}", source, status),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_ascii_lowercase());
        let bytes = response.bytes().await?.to_vec();

        if content_type_is_pdf(content_type.as_deref())
            || url_looks_like_pdf(source)
            || bytes_look_like_pdf(&bytes)
        {
            return pdf_to_text(source, bytes).await;
        }

        match content_type.as_deref() {
            None => utf8_text(source, bytes),
            Some(ct) if content_type_is_text(ct) => utf8_text(source, bytes),
            Some(ct) => Err(ScoutError::ConfigError {
                message: format!("knowledge base {} has unsupported content type {}", source, ct),
            }),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The document trimmed to at most `max_chars` characters.
    pub fn excerpt(&self, max_chars: usize) -> &str {
        match self.content.char_indices().nth(max_chars) {
            Some((cut, _)) => &self.content[..cut],
            None => &self.content,
        }
    }
}

fn content_type_is_pdf(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.starts_with("application/pdf"))
}

fn content_type_is_text(content_type: &str) -> bool {
    content_type.starts_with("text/")
        || content_type.contains("json")
        || content_type.contains("xml")
        || content_type.contains("markdown")
}

fn url_looks_like_pdf(source: &str) -> bool {
    let path = match parse_web_url(source) {
        Ok(url) => url.path().to_ascii_lowercase(),
        Err(_) => source.to_ascii_lowercase(),
    };
    path.ends_with(".pdf")
}

fn bytes_look_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

fn utf8_text(source: &str, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| ScoutError::ConfigError {
        message: format!("knowledge base {} is not UTF-8 text", source),
    })
}

/// Text layer of a PDF. Parsing runs on the blocking pool; a malformed file
/// that makes the parser panic surfaces as a config error.
async fn pdf_to_text(source: &str, bytes: Vec<u8>) -> Result<String> {
    let parsed = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| ScoutError::ConfigError {
            message: format!("knowledge base {} could not be parsed as PDF: {}", source, e),
        })?;

    parsed.map_err(|e| ScoutError::ConfigError {
        message: format!("knowledge base {} could not be parsed as PDF: {}", source, e),
    })
}
