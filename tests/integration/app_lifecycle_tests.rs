/*!
 * Integration tests for application lifecycle
 */

use std::fs;
use anyhow::Result;
use yapt::app_config::{Config, TranslationEngine};
use yapt::app_controller::Controller;
use yapt::errors::AppError;
use crate::common;

/// Test the controller with custom configuration
#[test]
fn test_controller_withCustomConfig_shouldKeepConfiguration() -> Result<()> {
    let mut config = Config::default();
    config.target_language = "ja".to_string();
    config.engine = TranslationEngine::Ollama;

    let controller = Controller::with_config(config)?;
    assert_eq!(controller.config().target_language, "ja");
    assert_eq!(controller.config().engine, TranslationEngine::Ollama);
    assert!(!controller.cancellation_flag().is_cancelled());
    Ok(())
}

/// Test that an invalid target language is rejected up front
#[test]
fn test_controller_withInvalidLanguage_shouldFail() {
    let mut config = Config::default();
    config.target_language = "nope".to_string();
    assert!(Controller::with_config(config).is_err());
}

/// Test that a missing input file fails before any backend is contacted
#[test]
fn test_run_withMissingInput_shouldFailWithFileError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_config(common::test_config())?.without_progress();

    let result = tokio_test::block_on(async {
        controller
            .run(&temp_dir.path().join("missing.pdf"), &temp_dir.path().join("out.pdf"), None)
            .await
    });
    let error = result.expect_err("missing input should fail");

    assert!(matches!(error.downcast_ref::<AppError>(), Some(AppError::File(_))));
    Ok(())
}

/// Test that an unreadable PDF is reported as a PDF error
#[tokio::test]
async fn test_run_withCorruptInput_shouldFailWithPdfError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("corrupt.pdf");
    fs::write(&input, b"this is not a pdf")?;
    let output = temp_dir.path().join("out.pdf");

    let controller = Controller::with_config(common::test_config())?.without_progress();
    let error = controller
        .run_with_translator(std::sync::Arc::new(yapt::providers::mock::MockProvider::working()), &input, &output, None)
        .await
        .expect_err("corrupt input should fail");

    assert!(matches!(error.downcast_ref::<AppError>(), Some(AppError::Pdf(_))));
    assert!(!output.exists());
    Ok(())
}

/// Test that an unreachable Ollama server stops the run before extraction
#[tokio::test]
async fn test_run_withUnreachableOllama_shouldFailBeforeWritingOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_sample_pdf(temp_dir.path())?;
    let output = temp_dir.path().join("out.pdf");

    let mut config = common::test_config();
    config.engine = TranslationEngine::Ollama;
    config.translation.ollama.endpoint = "http://127.0.0.1:1".to_string();
    config.translation.ollama.list_timeout_secs = 2;

    let controller = Controller::with_config(config)?.without_progress();
    let result = controller.run(&input, &output, None).await;

    assert!(result.is_err());
    assert!(!output.exists());
    Ok(())
}
