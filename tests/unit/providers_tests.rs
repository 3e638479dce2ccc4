/*!
 * Tests for provider implementations
 */

use yapt::app_config::{Config, OllamaConfig, TranslationEngine};
use yapt::errors::ProviderError;
use yapt::providers::google::GoogleTranslate;
use yapt::providers::mock::MockProvider;
use yapt::providers::ollama::Ollama;
use yapt::translation::prompts::{clean_response, PromptTemplate};
use yapt::translation::{build_translator, OllamaTranslator, Translator};

/// Test parsing a multi-segment response of the translate API
#[test]
fn test_googleParseResponse_withSegments_shouldKeepOrderAndLanguage() {
    let body = r#"[[["Bonjour. ","Hello. ",null,null,10],["Au revoir.","Goodbye.",null,null,10]],null,"en"]"#;
    let response = GoogleTranslate::parse_response(body).unwrap();
    assert_eq!(response.segments, vec!["Bonjour. ".to_string(), "Au revoir.".to_string()]);
    assert_eq!(response.detected_language.as_deref(), Some("en"));
}

/// Test parsing of malformed translate API responses
#[test]
fn test_googleParseResponse_withUnexpectedBody_shouldFail() {
    assert!(matches!(GoogleTranslate::parse_response("<html>"), Err(ProviderError::ParseError(_))));
    assert!(matches!(GoogleTranslate::parse_response("{\"a\":1}"), Err(ProviderError::ParseError(_))));
}

/// Test parsing a single JSON generation body
#[test]
fn test_ollamaParseGeneration_withSingleBody_shouldReturnResponse() {
    let body = r#"{"model":"gemma2:9b","response":"Bonjour le monde","done":true,"eval_count":5}"#;
    let response = Ollama::parse_generation(body).unwrap();
    assert_eq!(response.response, "Bonjour le monde");
    assert_eq!(response.eval_count, Some(5));
    assert!(Ollama::parse_generation("not json").is_err());
}

/// Test rendering of the default prompt
#[test]
fn test_promptTemplate_withDefaultTemplate_shouldNameLanguageNatively() {
    let template = PromptTemplate::new(OllamaConfig::default().prompt_template);
    let prompt = template.render("Hello world", "zh-TW");
    assert!(prompt.contains("Translate the following text to 繁體中文."));
    assert!(prompt.contains("Hello world"));
    assert!(!prompt.contains("{text}"));
}

/// Test cleanup of model answers
#[test]
fn test_cleanResponse_shouldStripQuotesAndLabels() {
    assert_eq!(clean_response("  \"Bonjour\"  ", "Hello"), "Bonjour");
    assert_eq!(clean_response("Translation: Bonjour", "Hello"), "Bonjour");
    assert_eq!(clean_response("「你好」", "Hello"), "你好");
    assert_eq!(clean_response("   ", "Hello"), "Hello");
    assert_eq!(clean_response("Hello", "Hello"), "Hello");
}

/// Test that unbalanced and stacked quotes are all removed
#[test]
fn test_cleanResponse_withUnbalancedQuotes_shouldStripEveryQuote() {
    assert_eq!(clean_response("\"Bonjour", "Hello"), "Bonjour");
    assert_eq!(clean_response("'\"Bonjour\"'", "Hello"), "Bonjour");
    assert_eq!(clean_response("\"Translation: Bonjour'", "Hello"), "Bonjour");
}

/// Test the mock provider through the translator interface
#[tokio::test]
async fn test_mockProvider_asTranslator_shouldTagTarget() {
    let provider = MockProvider::working();
    assert_eq!(provider.translate("Hello", "ja").await.unwrap(), "[ja] Hello");
    assert!(Translator::test_connection(&provider).await.is_ok());
    assert!(Translator::test_connection(&MockProvider::failing()).await.is_err());
    assert_eq!(provider.request_count(), 1);
}

/// Test that an unreachable Ollama server is reported as a connection error
#[tokio::test]
async fn test_ollamaConnect_withUnreachableServer_shouldFailWithConnectionError() {
    let mut config = OllamaConfig::default();
    config.endpoint = "http://127.0.0.1:1".to_string();
    config.list_timeout_secs = 2;

    let result = OllamaTranslator::connect(&config).await;
    assert!(matches!(result, Err(ProviderError::ConnectionError(_))));

    let mut app_config = Config::default();
    app_config.engine = TranslationEngine::Ollama;
    app_config.translation.ollama = config;
    assert!(build_translator(&app_config).await.is_err());
}

/// Test the engine names used in logs
#[test]
fn test_ollamaTranslator_withModel_shouldReportModelInName() {
    let translator = OllamaTranslator::with_model(&OllamaConfig::default(), "gemma2:9b");
    assert_eq!(translator.model(), "gemma2:9b");
    assert_eq!(translator.name(), "Ollama (gemma2:9b)");
}
