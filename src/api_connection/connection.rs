use std::env;

use thiserror::Error;
use tracing::debug;

use super::endpoints::{ChatCompletionRequest, ChatCompletionResponse, Provider};

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("Empty response: {0}")]
    EmptyResponse(String),
}

impl Provider {
    /// Builds an OpenRouter provider, reading the key from `api_key_env_var` now.
    /// A missing or blank key is reported immediately rather than on first call.
    pub fn openrouter(api_key_env_var: &str, base_url: &str) -> Result<Self, ApiConnectionError> {
        let api_key = env::var(api_key_env_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ApiConnectionError::MissingApiKey(api_key_env_var.to_string()))?;
        Ok(Self::openrouter_with_key(api_key, base_url))
    }

    pub fn openrouter_with_key(api_key: impl Into<String>, base_url: &str) -> Self {
        Self::OpenRouter {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn call_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match self {
            Provider::OpenRouter {
                api_key,
                base_url,
                client,
            } => {
                let url = format!("{}/chat/completions", base_url);
                let app_name = env::var("APP_NAME").unwrap_or_else(|_| "adsearch".to_string());
                debug!(model = %request.model, %url, "sending chat completion");

                let response = client
                    .post(&url)
                    .bearer_auth(api_key)
                    .header("X-Title", app_name)
                    .json(request)
                    .send()
                    .await?;

                if response.status().is_success() {
                    let body = response.text().await?;
                    Ok(serde_json::from_str::<ChatCompletionResponse>(&body)?)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }
}
