//! Minimal Anthropic Messages client used for structured classification.
//!
//! Every call forces a single tool whose input schema is derived from the
//! response type, so the model's answer is always machine-readable JSON.

mod types;

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use crate::schema::StructuredOutput;
use types::{ChatRequest, ChatResponse, ToolDefinitionWire};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const TOOL_NAME: &str = "structured_response";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct Claude {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: ANTHROPIC_API_URL.to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Ask the model to answer with a value of type `T`.
    pub async fn extract<T: StructuredOutput>(
        &self,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<T> {
        let request = ChatRequest::forced_tool(
            &self.model,
            system_prompt.into(),
            user_prompt.into(),
            ToolDefinitionWire {
                name: TOOL_NAME.to_string(),
                description: "Report the classification result.".to_string(),
                input_schema: T::input_schema(),
            },
        );

        debug!(model = %self.model, schema = %T::type_name(), "Claude structured request");

        let response = self
            .http
            .post(format!("{}/messages", self.base_url))
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .context("Claude request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Claude API error ({status}): {error_text}"));
        }

        let body: ChatResponse = response
            .json()
            .await
            .context("Failed to parse Claude response")?;

        match body.tool_input(TOOL_NAME) {
            Some(input) => serde_json::from_value(input.clone())
                .map_err(|e| anyhow!("Failed to deserialize structured output: {e}")),
            None => Err(anyhow!(
                "No structured output in Claude response{}",
                body.text().map(|t| format!(": {t}")).unwrap_or_default()
            )),
        }
    }
}
