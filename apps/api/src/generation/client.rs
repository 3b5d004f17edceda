//! AI client — the single point of entry for the external text-generation
//! service that turns a structured form into an HTML document.
//!
//! The rest of the crate depends on the `CvGenerator` trait only, so tests
//! substitute a canned generator and the HTTP client stays swappable.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 8192;
const MAX_RETRIES: u32 = 3;

const SYSTEM_PROMPT: &str = "You are a professional CV writer. Given structured \
applicant data, a template name, and a target industry, produce one complete, \
self-contained HTML document for the CV. Return only the HTML document with \
inline styles, no commentary and no markdown fences.";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("generator returned empty content")]
    EmptyContent,
}

#[async_trait]
pub trait CvGenerator: Send + Sync {
    /// Renders the applicant's form data into a complete HTML CV.
    async fn generate(
        &self,
        form_data: &Value,
        template: &str,
        industry: &str,
    ) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

/// Reqwest-backed generator. Retries 429 and 5xx responses with
/// exponential backoff.
#[derive(Clone)]
pub struct HttpCvGenerator {
    client: Client,
    api_key: String,
}

impl HttpCvGenerator {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    async fn call(&self, prompt: String) -> Result<String, GenerationError> {
        let request_body = ApiRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT,
            messages: vec![ApiMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<GenerationError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "generation attempt {} failed, retrying after {}ms",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", API_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(GenerationError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("generation API returned {status}: {body}");
                last_error = Some(GenerationError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(GenerationError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let api_response: ApiResponse = response.json().await?;
            let text = api_response
                .content
                .iter()
                .find(|b| b.block_type == "text")
                .and_then(|b| b.text.as_deref())
                .ok_or(GenerationError::EmptyContent)?;

            debug!("generation succeeded ({} bytes)", text.len());
            return Ok(strip_html_fences(text).to_string());
        }

        Err(last_error.unwrap_or(GenerationError::EmptyContent))
    }
}

#[async_trait]
impl CvGenerator for HttpCvGenerator {
    async fn generate(
        &self,
        form_data: &Value,
        template: &str,
        industry: &str,
    ) -> Result<String, GenerationError> {
        let prompt = format!(
            "Template: {template}\nIndustry: {industry}\nApplicant data (JSON):\n{}",
            serde_json::to_string_pretty(form_data).unwrap_or_else(|_| form_data.to_string())
        );
        self.call(prompt).await
    }
}

/// Strips ```html ... ``` or ``` ... ``` fences when the model wraps its
/// output despite instructions.
fn strip_html_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```html") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
