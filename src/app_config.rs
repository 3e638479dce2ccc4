use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::time::Duration;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Target language tag (e.g. "zh-TW", "fr")
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation engine to use
    #[serde(default)]
    pub engine: TranslationEngine,

    /// Translation backends configuration
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Text re-insertion settings
    #[serde(default)]
    pub overlay: OverlayConfig,

    /// Text run extraction settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation engine type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationEngine {
    // @engine: Remote translate API
    #[default]
    Google,
    // @engine: Local Ollama server
    Ollama,
}

impl TranslationEngine {
    // @returns: Capitalized engine name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Google => "Google Translate",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Lowercase engine identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Google => "google".to_string(),
            Self::Ollama => "ollama".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationEngine {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!("Invalid engine type: {}", s)),
        }
    }
}

/// Remote translate API configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GoogleConfig {
    /// Service endpoint URL
    #[serde(default = "default_google_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_google_timeout_secs")]
    pub timeout_secs: u64,

    /// Fixed delay after every request in milliseconds
    #[serde(default = "default_google_delay_ms")]
    pub delay_ms: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            endpoint: default_google_endpoint(),
            timeout_secs: default_google_timeout_secs(),
            delay_ms: default_google_delay_ms(),
        }
    }
}

/// Ollama service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaConfig {
    /// Service endpoint URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Model name; empty selects one automatically
    #[serde(default)]
    pub model: String,

    /// Timeout for listing installed models, in seconds
    #[serde(default = "default_ollama_list_timeout_secs")]
    pub list_timeout_secs: u64,

    /// Timeout for a generation request, in seconds
    #[serde(default = "default_ollama_timeout_secs")]
    pub timeout_secs: u64,

    /// Fixed delay after every request in milliseconds
    #[serde(default = "default_ollama_delay_ms")]
    pub delay_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling parameter
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Prompt template
    /// Placeholders: {target_language}, {text}
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ollama_endpoint(),
            model: String::new(),
            list_timeout_secs: default_ollama_list_timeout_secs(),
            timeout_secs: default_ollama_timeout_secs(),
            delay_ms: default_ollama_delay_ms(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            prompt_template: default_prompt_template(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Remote translate API settings
    #[serde(default)]
    pub google: GoogleConfig,

    /// Local LLM settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Reuse translations of identical text within a run
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            google: GoogleConfig::default(),
            ollama: OllamaConfig::default(),
            cache_enabled: true,
        }
    }
}

impl TranslationConfig {
    /// Get the endpoint for an engine
    pub fn get_endpoint(&self, engine: TranslationEngine) -> &str {
        match engine {
            TranslationEngine::Google => &self.google.endpoint,
            TranslationEngine::Ollama => &self.ollama.endpoint,
        }
    }

    /// Fixed delay applied after each request to an engine
    pub fn request_delay(&self, engine: TranslationEngine) -> Duration {
        match engine {
            TranslationEngine::Google => Duration::from_millis(self.google.delay_ms),
            TranslationEngine::Ollama => Duration::from_millis(self.ollama.delay_ms),
        }
    }
}

/// Settings for re-inserting translated text
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OverlayConfig {
    /// Inserted font size relative to the original
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,

    /// Smallest inserted font size in points
    #[serde(default = "default_min_font_size")]
    pub min_font_size: f32,

    /// Baseline offset below the run's top edge, relative to the original size
    #[serde(default = "default_baseline_ratio")]
    pub baseline_ratio: f32,

    /// Font fallback chain; empty picks one for the target language
    #[serde(default)]
    pub fonts: Vec<String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            font_scale: default_font_scale(),
            min_font_size: default_min_font_size(),
            baseline_ratio: default_baseline_ratio(),
            fonts: Vec::new(),
        }
    }
}

/// Settings for collecting text runs
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// Runs whose trimmed text is shorter than this are ignored
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_text_chars: default_min_text_chars(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching filter for the `log` facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_target_language() -> String {
    "zh-TW".to_string()
}

fn default_google_endpoint() -> String {
    "https://translate.googleapis.com".to_string()
}

fn default_google_timeout_secs() -> u64 {
    10
}

fn default_google_delay_ms() -> u64 {
    500
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_list_timeout_secs() -> u64 {
    5
}

fn default_ollama_timeout_secs() -> u64 {
    30
}

fn default_ollama_delay_ms() -> u64 {
    100
}

fn default_temperature() -> f32 {
    0.3
}

fn default_top_p() -> f32 {
    0.9
}

fn default_prompt_template() -> String {
    "You are a professional translator. Translate the following text to {target_language}.
Rules:
- Only provide the translation
- Do not include any explanations, notes, or the original text
- Maintain the original meaning and tone
- Keep proper nouns and technical terms appropriate

Text to translate:
{text}

Translation:".to_string()
}

fn default_font_scale() -> f32 {
    0.7
}

fn default_min_font_size() -> f32 {
    6.0
}

fn default_baseline_ratio() -> f32 {
    0.75
}

fn default_min_text_chars() -> usize {
    2
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.target_language)?;

        if self.translation.get_endpoint(self.engine).trim().is_empty() {
            return Err(anyhow!("Endpoint is required for the {} engine", self.engine.display_name()));
        }

        if self.translation.google.timeout_secs == 0
            || self.translation.ollama.timeout_secs == 0
            || self.translation.ollama.list_timeout_secs == 0
        {
            return Err(anyhow!("Request timeouts must be greater than zero"));
        }

        if !self.translation.ollama.prompt_template.contains("{text}") {
            return Err(anyhow!("Prompt template must contain the {{text}} placeholder"));
        }

        if !(self.overlay.font_scale > 0.0 && self.overlay.font_scale <= 2.0) {
            return Err(anyhow!("Overlay font scale must be in (0, 2], got {}", self.overlay.font_scale));
        }

        if self.overlay.min_font_size <= 0.0 {
            return Err(anyhow!("Minimum font size must be positive, got {}", self.overlay.min_font_size));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: default_target_language(),
            engine: TranslationEngine::default(),
            translation: TranslationConfig::default(),
            overlay: OverlayConfig::default(),
            extraction: ExtractionConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
