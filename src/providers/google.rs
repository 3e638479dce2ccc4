use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::{preview, Provider};
use crate::errors::ProviderError;

/// Client for the public Google translate endpoint
#[derive(Debug, Clone)]
pub struct GoogleTranslate {
    /// Base URL of the service
    endpoint: String,
    /// HTTP client for making requests
    client: Client,
}

/// A single translation request
#[derive(Debug, Clone)]
pub struct TranslateRequest {
    /// Text to translate
    pub text: String,
    /// Source language, "auto" to detect
    pub source_language: String,
    /// Target language code
    pub target_language: String,
}

impl TranslateRequest {
    /// Create a request with automatic source detection
    pub fn new(text: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_language: "auto".to_string(),
            target_language: target_language.into(),
        }
    }
}

/// Translated segments returned by the service
#[derive(Debug, Clone, Default)]
pub struct TranslateResponse {
    /// Translated text, one entry per sentence segment
    pub segments: Vec<String>,
    /// Language the service detected, when reported
    pub detected_language: Option<String>,
}

impl GoogleTranslate {
    /// Create a client with a request timeout
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
        }
    }

    fn request_url(&self, request: &TranslateRequest) -> Result<Url, ProviderError> {
        let base = format!("{}/translate_a/single", self.endpoint);
        Url::parse_with_params(
            &base,
            &[
                ("client", "gtx"),
                ("sl", request.source_language.as_str()),
                ("tl", request.target_language.as_str()),
                ("dt", "t"),
                ("q", request.text.as_str()),
            ],
        )
        .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint '{}': {}", self.endpoint, e)))
    }

    /// Parse the nested array payload of the service
    ///
    /// The first element holds `[translated, original, ...]` segments, the
    /// third element the detected source language.
    pub fn parse_response(body: &str) -> Result<TranslateResponse, ProviderError> {
        let value: Value = serde_json::from_str(body).map_err(|e| {
            error!("Failed to parse translate response: {}. Raw response (first 500 chars): {}", e, preview(body));
            ProviderError::ParseError(e.to_string())
        })?;

        let segments = value
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::ParseError("Missing translation segments".to_string()))?
            .iter()
            .filter_map(|segment| segment.get(0).and_then(Value::as_str))
            .map(str::to_string)
            .collect();

        let detected_language = value.get(2).and_then(Value::as_str).map(str::to_string);

        Ok(TranslateResponse { segments, detected_language })
    }
}

#[async_trait]
impl Provider for GoogleTranslate {
    type Request = TranslateRequest;
    type Response = TranslateResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let url = self.request_url(&request)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Translate API error ({}): {}", status, preview(&message));
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed = Self::parse_response(&body)?;
        debug!("Translated {} chars into {} segments", request.text.chars().count(), parsed.segments.len());
        Ok(parsed)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let response = self.complete(TranslateRequest::new("Hello", "fr")).await?;
        if response.segments.is_empty() {
            return Err(ProviderError::ParseError("Empty test translation".to_string()));
        }
        Ok(())
    }

    fn extract_text(response: &Self::Response) -> String {
        response.segments.concat()
    }
}
