/*!
 * Provider implementations for the translation backends.
 *
 * This module contains client implementations for the supported services:
 * - Google: remote translate API
 * - Ollama: local LLM server
 * - Mock: in-process provider for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all backend clients
///
/// Each client speaks its own request/response types; the translation layer
/// wraps them behind a single `Translator` interface.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Truncate a response body for log output
pub(crate) fn preview(text: &str) -> String {
    if text.chars().count() > 500 {
        text.chars().take(500).collect::<String>()
    } else {
        text.to_string()
    }
}

pub mod google;
pub mod ollama;
pub mod mock;
