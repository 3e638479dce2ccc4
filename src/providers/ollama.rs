use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{preview, Provider};
use crate::errors::ProviderError;

/// Ollama client for interacting with Ollama API
#[derive(Debug, Clone)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Timeout for the model listing request
    list_timeout: Duration,
}

/// Generate request for the Ollama API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
}

/// Generation options for the Ollama API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    #[serde(default)]
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

/// Installed model as reported by `/api/tags`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            options: None,
            stream: false,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    /// Set nucleus sampling
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).top_p = Some(top_p);
        self
    }
}

impl Ollama {
    /// Create a new Ollama client from a base URL
    pub fn new(base_url: impl Into<String>, timeout_secs: u64, list_timeout_secs: u64) -> Self {
        let base_url = base_url.into();
        // Accept a bare host:port
        let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url
        } else {
            format!("http://{}", base_url)
        };

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            list_timeout: Duration::from_secs(list_timeout_secs),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List the names of the installed models
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url)
            .timeout(self.list_timeout)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Cannot reach Ollama at {}: {}", self.base_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, preview(&message));
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Generate text from the Ollama API
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let response = self.client.post(&url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, preview(&message));
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        Self::parse_generation(&body)
    }

    /// Parse a generation body, accepting a streamed JSONL body as well
    pub fn parse_generation(body: &str) -> Result<GenerationResponse, ProviderError> {
        match serde_json::from_str::<GenerationResponse>(body) {
            Ok(response) => Ok(response),
            Err(e) => {
                let chunks: Vec<GenerationResponse> = body
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .filter_map(|line| serde_json::from_str(line).ok())
                    .collect();
                if chunks.is_empty() {
                    error!("Failed to parse Ollama API response: {}. Raw response (first 500 chars): {}", e, preview(body));
                    return Err(ProviderError::ParseError(e.to_string()));
                }

                debug!("Ollama returned {} streamed chunks", chunks.len());
                let last = chunks.last().cloned();
                Ok(GenerationResponse {
                    model: last.as_ref().map(|c| c.model.clone()).unwrap_or_default(),
                    response: chunks.iter().map(|c| c.response.as_str()).collect(),
                    done: last.as_ref().is_some_and(|c| c.done),
                    eval_count: last.and_then(|c| c.eval_count),
                })
            }
        }
    }
}

#[async_trait]
impl Provider for Ollama {
    type Request = GenerationRequest;
    type Response = GenerationResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.generate(request).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.list_models().await.map(|_| ())
    }

    fn extract_text(response: &Self::Response) -> String {
        response.response.clone()
    }
}

/// Choose the model to translate with
///
/// A requested model must be installed. Without a request the first model
/// whose name contains "gemma" wins, then the first installed model.
pub fn select_model(models: &[String], requested: Option<&str>) -> Result<String, ProviderError> {
    if models.is_empty() {
        return Err(ProviderError::NoModels);
    }

    match requested.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => {
            if models.iter().any(|m| m == name) {
                Ok(name.to_string())
            } else {
                Err(ProviderError::ModelNotFound {
                    requested: name.to_string(),
                    available: models.join(", "),
                })
            }
        }
        None => Ok(models
            .iter()
            .find(|m| m.to_lowercase().contains("gemma"))
            .unwrap_or(&models[0])
            .clone()),
    }
}
