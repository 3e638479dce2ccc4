/*!
 * Translation engines.
 *
 * A `Translator` turns one text into its translation. Each engine wraps a
 * provider client and adapts its request/response types.
 */

use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use crate::app_config::{Config, GoogleConfig, OllamaConfig, TranslationEngine};
use crate::errors::ProviderError;
use crate::providers::google::{GoogleTranslate, TranslateRequest};
use crate::providers::ollama::{select_model, GenerationRequest, Ollama};
use crate::providers::Provider;
use super::prompts::{clean_response, PromptTemplate};

/// A backend able to translate text
#[async_trait]
pub trait Translator: Send + Sync {
    /// Display name for logs and reports
    fn name(&self) -> String;

    /// Translate a text into the target language
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError>;

    /// Check that the backend is reachable and usable
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Remote translate API engine
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: GoogleTranslate,
}

impl GoogleTranslator {
    pub fn new(config: &GoogleConfig) -> Self {
        Self {
            client: GoogleTranslate::new(config.endpoint.clone(), config.timeout_secs),
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn name(&self) -> String {
        TranslationEngine::Google.display_name().to_string()
    }

    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        let response = self.client.complete(TranslateRequest::new(text, target_language)).await?;
        let translated = GoogleTranslate::extract_text(&response);
        if translated.trim().is_empty() {
            return Ok(text.to_string());
        }
        Ok(translated)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.client.test_connection().await
    }
}

/// Local LLM engine
#[derive(Debug, Clone)]
pub struct OllamaTranslator {
    client: Ollama,
    model: String,
    template: PromptTemplate,
    temperature: f32,
    top_p: f32,
}

impl OllamaTranslator {
    /// Create an engine bound to an explicit model
    pub fn with_model(config: &OllamaConfig, model: impl Into<String>) -> Self {
        Self {
            client: Ollama::new(config.endpoint.clone(), config.timeout_secs, config.list_timeout_secs),
            model: model.into(),
            template: PromptTemplate::new(config.prompt_template.clone()),
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }

    /// Connect to the server and pick the model to use
    ///
    /// Fails when the server is unreachable, has no models, or lacks the
    /// configured model.
    pub async fn connect(config: &OllamaConfig) -> Result<Self, ProviderError> {
        let client = Ollama::new(config.endpoint.clone(), config.timeout_secs, config.list_timeout_secs);
        let models = client.list_models().await?;
        debug!("Ollama models: {}", models.join(", "));

        let requested = Some(config.model.as_str()).filter(|m| !m.trim().is_empty());
        let model = select_model(&models, requested)?;
        info!("Using Ollama model: {}", model);

        Ok(Self::with_model(config, model))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    fn name(&self) -> String {
        format!("{} ({})", TranslationEngine::Ollama.display_name(), self.model)
    }

    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        let prompt = self.template.render(text, target_language);
        let request = GenerationRequest::new(self.model.clone(), prompt)
            .temperature(self.temperature)
            .top_p(self.top_p);

        let response = self.client.complete(request).await?;
        Ok(clean_response(&Ollama::extract_text(&response), text))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let models = self.client.list_models().await?;
        select_model(&models, Some(&self.model)).map(|_| ())
    }
}

/// Build the engine selected by the configuration
pub async fn build_translator(config: &Config) -> Result<Arc<dyn Translator>, ProviderError> {
    let translator: Arc<dyn Translator> = match config.engine {
        TranslationEngine::Google => Arc::new(GoogleTranslator::new(&config.translation.google)),
        TranslationEngine::Ollama => Arc::new(OllamaTranslator::connect(&config.translation.ollama).await?),
    };
    Ok(translator)
}
