use crate::domain::ports::{GenerateRequest, LanguageModel};
use crate::utils::error::{Result, ScoutError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Client for the Gemini `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_key, model, Duration::from_secs(120))
    }

    pub fn with_timeout(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_URL.to_string(),
            http,
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key).map_err(|_| ScoutError::ConfigError {
            message: "API key contains characters not allowed in a header".to_string(),
        })?;
        headers.insert("x-goog-api-key", key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let joined_instructions = request.instructions.join("\n");
        let body = GenerateContentRequest {
            system_instruction: (!request.instructions.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part {
                    text: &joined_instructions,
                }],
            }),
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: request
                    .response_schema
                    .as_ref()
                    .map(|_| "application/json"),
                response_schema: request.response_schema.as_ref(),
            },
        };

        tracing::debug!("Gemini request: model={}, prompt_chars={}", self.model, request.prompt.len());

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ScoutError::ModelError {
                message: format!("Gemini API error ({}): {}", status, error_text),
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;

        // blocked or filtered answers come back as an empty string, not an error
        let Some(candidate) = parsed.candidates.into_iter().next() else {
            tracing::warn!(
                "⚠️ Gemini returned no candidates (feedback: {})",
                parsed
                    .prompt_feedback
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "none".to_string())
            );
            return Ok(String::new());
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            tracing::warn!(
                "⚠️ Gemini returned an empty candidate (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            );
        }

        tracing::debug!("Gemini response: {} chars", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new("test-key", "gemini-test")
            .unwrap()
            .with_base_url(&server.base_url())
    }

    #[tokio::test]
    async fn test_generate_sends_schema_and_returns_text() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-test:generateContent")
                .header("x-goog-api-key", "test-key")
                .body_contains("\"responseMimeType\":\"application/json\"")
                .body_contains("Find shops");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "{\"items\": []}"}]},
                    "finishReason": "STOP"
                }]
            }));
        });

        let request = GenerateRequest {
            instructions: vec!["Find shops".to_string()],
            prompt: "Samsung S25".to_string(),
            response_schema: Some(json!({"type": "OBJECT"})),
        };
        let text = client(&server).generate(&request).await.unwrap();

        mock.assert();
        assert_eq!(text, "{\"items\": []}");
    }

    #[tokio::test]
    async fn test_generate_maps_http_failure_to_model_error() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1beta/models/gemini-test:generateContent");
            then.status(429).body("quota exceeded");
        });

        let err = client(&server)
            .generate(&GenerateRequest {
                prompt: "hi".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        mock.assert();
        match err {
            ScoutError::ModelError { message } => {
                assert!(message.contains("429"));
                assert!(message.contains("quota exceeded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_without_candidates_is_empty_text() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1beta/models/gemini-test:generateContent");
            then.status(200)
                .json_body(json!({"promptFeedback": {"blockReason": "SAFETY"}}));
        });

        let text = client(&server)
            .generate(&GenerateRequest {
                prompt: "hi".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_generate_blocked_candidate_is_empty_text() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1beta/models/gemini-test:generateContent");
            then.status(200)
                .json_body(json!({"candidates": [{"finishReason": "SAFETY"}]}));
        });

        let text = client(&server)
            .generate(&GenerateRequest {
                prompt: "hi".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(text, "");
    }
}
